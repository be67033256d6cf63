//! An interactive tour of tagged allocation. Blocks of `u64`s are allocated in
//! either host memory or a small scratch arena, and each memory space keeps
//! its own counters.

use std::{
    collections::{hash_map::Entry, HashMap},
    sync::Mutex,
};

use clap::Parser;
use linefeed::{Interface, ReadResult};
use tagalloc::{Counting, Error, HostSystem, SelectSystem, StaticArena, TaggedAllocator};

use crate::parsing::{Command, Space};

mod parsing;

type Scratch = Counting<StaticArena<Mutex<()>, 0x1000>>;

static HOST: Counting<HostSystem> = Counting::new(HostSystem);
static SCRATCH: Scratch = Counting::new(StaticArena::new());

#[derive(Clone, Copy, Default)]
struct CountedHost;
impl SelectSystem for CountedHost {
    type System = &'static Counting<HostSystem>;

    fn select_system(self) -> Self::System {
        &HOST
    }
}

#[derive(Clone, Copy, Default)]
struct ScratchTag;
impl SelectSystem for ScratchTag {
    type System = &'static Scratch;

    fn select_system(self) -> Self::System {
        &SCRATCH
    }
}

const HOST_ALLOCATOR: TaggedAllocator<u64, CountedHost> = TaggedAllocator::new();
const SCRATCH_ALLOCATOR: TaggedAllocator<u64, ScratchTag> = TaggedAllocator::new();

enum AllocFailure {
    TooMany { max: usize },
    Backend(Error),
}

/// Allocates `count` u64s in `space`, refusing counts whose byte size would
/// not fit in a `usize` before they reach the backend.
fn allocate(space: Space, count: usize) -> Result<*mut u64, AllocFailure> {
    let max = match space {
        Space::Host => HOST_ALLOCATOR.max_size(),
        Space::Scratch => SCRATCH_ALLOCATOR.max_size(),
    };
    if count > max {
        return Err(AllocFailure::TooMany { max });
    }
    match space {
        Space::Host => HOST_ALLOCATOR.allocate(count),
        Space::Scratch => SCRATCH_ALLOCATOR.allocate(count),
    }
    .map_err(AllocFailure::Backend)
}

/// # Safety
/// `ptr` must come from [`allocate`] in the same `space` and not be freed yet.
unsafe fn deallocate(space: Space, ptr: *mut u64, count: usize) {
    unsafe {
        match space {
            Space::Host => HOST_ALLOCATOR.deallocate(ptr, count),
            Space::Scratch => SCRATCH_ALLOCATOR.deallocate(ptr, count),
        }
    }
}

fn print_stats(space: Space) {
    let stats = match space {
        Space::Host => HOST.snapshot(),
        Space::Scratch => SCRATCH.snapshot(),
    };
    println!(
        "{space:?}: {} allocations ({} failed), {} frees, {} live, {:#x} bytes requested",
        stats.allocations,
        stats.failures,
        stats.frees,
        stats.live(),
        stats.bytes_requested
    );
    if space == Space::Scratch {
        println!("  {:?}", SCRATCH.inner());
    }
}

fn main() -> anyhow::Result<()> {
    let interface = Interface::new("tagalloc-demo")?;
    interface.set_prompt("[∴] ")?;

    let mut blocks: HashMap<usize, (Space, usize)> = HashMap::new();

    while let ReadResult::Input(command) = interface.read_line()? {
        match Command::try_parse_from(["[∴]"].into_iter().chain(command.split(' '))) {
            Ok(Command::Exit) => break,
            Ok(Command::Alloc { space, count }) => {
                match allocate(space, count) {
                    Ok(ptr) => {
                        println!("Allocated {count} u64s in {space:?} memory at {ptr:p}");
                        blocks.insert(ptr as usize, (space, count));
                    }
                    Err(AllocFailure::TooMany { max }) => {
                        println!("At most {max:#x} u64s fit in one allocation!");
                    }
                    Err(AllocFailure::Backend(Error::Exhausted)) => {
                        println!("The scratch arena has no room for {count} u64s!");
                    }
                    Err(AllocFailure::Backend(Error::SizeOverflow)) => {
                        println!("That many u64s would overflow the address space!");
                    }
                    Err(AllocFailure::Backend(e)) => println!("Allocation failed: {e}"),
                }
            }
            Ok(Command::Free { addr }) => match blocks.entry(addr) {
                Entry::Occupied(entry) => {
                    let (space, count) = entry.remove();
                    unsafe { deallocate(space, addr as *mut u64, count) };
                    println!("Freed {addr:#x} from {space:?} memory");
                }
                Entry::Vacant(_) => {
                    println!("There is no allocation at {addr:#x}");
                }
            },
            Ok(Command::Stats { space: Some(space) }) => print_stats(space),
            Ok(Command::Stats { space: None }) => {
                print_stats(Space::Host);
                print_stats(Space::Scratch);
            }
            Ok(Command::MaxSize) => {
                println!("At most {:#x} u64s per allocation", HOST_ALLOCATOR.max_size());
            }
            Err(err) => {
                println!();
                err.print()?;
                println!();
                continue;
            }
        }
    }

    for (addr, (space, count)) in blocks {
        unsafe { deallocate(space, addr as *mut u64, count) };
    }

    Ok(())
}
