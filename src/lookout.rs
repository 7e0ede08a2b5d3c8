use howlong::SteadyTimer;
use tracing::info;

/// Runs `f`, logging how long it took when `enabled`.
pub fn watch<T>(name: &str, enabled: bool, f: impl FnOnce() -> T) -> T {
  if !enabled {
    return f();
  }

  let timer = SteadyTimer::new();
  let result = f();
  let duration = timer.elapsed();
  info!("{}: {}ms", name, duration.as_millis());
  result
}
