//! Catalog command

use anyhow::Result;
use cfx_ops::FilterCatalog;
use tracing::trace;

pub fn run(verbose: u8) -> Result<()> {
    trace!("catalog::run");

    let catalog = FilterCatalog::standard();
    for method in catalog.methods() {
        println!("{method}");
    }
    if verbose > 0 {
        println!("{} methods", catalog.len());
    }
    Ok(())
}
