pub fn format_log(
  buf: &mut env_logger::fmt::Formatter,
  record: &log::Record,
) -> std::io::Result<()> {
  use std::io::Write;
  let mut style = buf.style();
  use env_logger::fmt::Color::*;
  use log::Level::*;
  style.set_color(match record.level() {
    Error => Red,
    Warn => Yellow,
    Info => Green,
    Debug => Magenta,
    Trace => Blue,
  });

  let location = format!("{}:{}",
    record.file().unwrap_or("?"),
    record.line().unwrap_or(0),
  );
  let s = format!("{:5} {:32}{}", record.level(), location, record.args());
  writeln!(buf, "{}", style.value(s))
}

pub fn init_logging(level: log::LevelFilter) {
  // `try_init` so that tests and repeated calls don't panic.
  let _ = env_logger::Builder::new()
    .filter_level(level)
    .format(format_log)
    .try_init();
}
