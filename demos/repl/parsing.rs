use clap::{Parser, ValueEnum};
use clap_num::maybe_hex;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Space {
    #[default]
    Host,
    Scratch,
}

#[derive(Parser, Debug)]
#[command(disable_help_flag = true)]
pub enum Command {
    Alloc {
        #[arg(long, default_value = "host")]
        space: Space,

        #[arg(long, value_parser=maybe_hex::<usize>)]
        count: usize,
    },
    Free {
        #[arg(long, value_parser=maybe_hex::<usize>)]
        addr: usize,
    },
    Stats {
        #[arg(long)]
        space: Option<Space>,
    },
    MaxSize,

    Exit,
}
