//! The main entrypoint for the amicycle CLI

use anyhow::Result;

/// Run the CLI on a current-thread runtime; every service call is a
/// sequential await, so one thread is all that's needed.
fn run() -> Result<()> {
    amicycle_utils::initialize_tracing();
    tracing::trace!("starting {}", env!("CARGO_PKG_NAME"));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(amicycle_lib::cli::run())
}

fn main() {
    amicycle_utils::run_main(run)
}
