use tracing::Level;
use tracing_chrome::{ChromeLayerBuilder, FlushGuard};
use tracing_subscriber::{filter::LevelFilter, prelude::*};

/// Log to stderr up to `level`, and optionally trace to chrome://tracing or
/// https://ui.perfetto.dev/
///
/// Make sure to store the returned guard in a variable in the scope to be instrumented,
/// otherwise the trace will be flushed and disabled immediately.
pub fn init(level: Level, chrome: bool) -> Option<FlushGuard> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(LevelFilter::from_level(level));

    let (chrome_layer, guard) = if chrome {
        let (layer, guard) = ChromeLayerBuilder::new().build();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(chrome_layer)
        .with(fmt_layer)
        .init();

    guard
}
