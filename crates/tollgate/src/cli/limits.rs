//! `tollgate limits` handler.

use tollgate::{RateLimiters, TollgateConfig, TollgateResult};

/// Print each operation class with its capacity and window.
pub fn show_limits(config: &TollgateConfig) -> TollgateResult<()> {
    config.validate()?;
    let limiters = RateLimiters::from_config(&config.rate_limits)?;

    println!("{:<16} {:>8} {:>12}", "CLASS", "CAPACITY", "WINDOW");
    for status in limiters.snapshot() {
        let window = status.snapshot.window();
        println!(
            "{:<16} {:>8} {:>11}s",
            status.class.as_ref(),
            status.snapshot.capacity(),
            window.as_secs_f64()
        );
    }
    Ok(())
}
