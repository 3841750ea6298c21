//! Brush command

use crate::BrushArgs;
use anyhow::Result;
use cfx_ops::Kernel;
use tracing::trace;

pub fn run(args: BrushArgs, verbose: u8) -> Result<()> {
    trace!(rx = args.rx, ry = args.ry, roll = args.roll, "brush::run");

    let kernel = Kernel::brush(args.rx, args.ry, args.roll);
    print!("{}", kernel.render());
    if verbose > 0 {
        println!("side {}, {} taps", kernel.side(), kernel.len());
    }
    Ok(())
}
