use std::env;
use std::fs;
use std::process;
use getopts::Options;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;
use lr::{CompactBlobs, CompactTable, TableAssets, ACTION_ERROR, GOTO_ERROR};

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(std::io::stderr)
    .init();

  let args = env::args().collect::<Vec<_>>();
  let prog = args[0].clone();
  let mut opts = Options::new();
  opts.optopt("t", "table",
    "Only show this table.\n\
      Supported tables: action, goto, recovery",
    "TABLE");
  opts.optflag("d", "dump", "Print every cell of the decoded tables");
  opts.optflag("h", "help", "Print this message");

  let matches = match opts.parse(&args[1..]) {
    Ok(m) => m,
    Err(err) => {
      eprintln!("{}", err);
      process::exit(1);
    }
  };

  if matches.opt_present("h") {
    print_usage(prog, opts);
    return;
  }

  let only = matches.opt_str("t").map(|t| t.to_lowercase());
  if let Some(t) = &only {
    if !["action", "goto", "recovery"].contains(&t.as_str()) {
      eprintln!("unknown table: {}", t);
      process::exit(1);
    }
  }

  let path = if matches.free.len() == 1 {
    matches.free[0].clone()
  } else {
    print_usage(prog, opts);
    process::exit(1);
  };

  let text = match fs::read_to_string(&path) {
    Ok(text) => text,
    Err(err) => {
      eprintln!("cannot read {}: {}", path, err);
      process::exit(1);
    }
  };

  let assets = match TableAssets::from_manifest(&text) {
    Ok(assets) => assets,
    Err(err) => {
      error!("{}", err);
      process::exit(1);
    }
  };
  debug!(path = %path, "read manifest");

  let tables = [
    ("action", &assets.action, ACTION_ERROR),
    ("goto", &assets.goto, GOTO_ERROR),
    ("recovery", &assets.recovery, ACTION_ERROR),
  ];

  for (name, blobs, sentinel) in tables.iter() {
    if only.as_deref().map_or(false, |t| t != *name) {
      continue;
    }
    if let Err(err) = show(name, blobs, *sentinel, matches.opt_present("d")) {
      error!("{}", err);
      process::exit(1);
    }
  }
}

fn show(
  name: &str,
  blobs: &CompactBlobs,
  sentinel: i32,
  dump: bool,
) -> Result<(), lr::TableError> {
  let table = CompactTable::decode(name, blobs, sentinel)?;
  let cells = table.rows() * table.cols();

  println!(
    "{}: {} x {}, {} significant cells of {}, {} x {} after deduplication",
    name,
    table.rows(),
    table.cols(),
    table.significant_cells(),
    cells,
    table.physical_rows(),
    table.physical_cols(),
  );

  if dump {
    for (r, row) in table.to_dense().iter().enumerate() {
      let cells = row.iter()
        .map(|&v| match v {
          v if v == sentinel => ".".to_owned(),
          v if name == "goto" => v.to_string(),
          v => format!("{:#06x}", v),
        })
        .collect::<Vec<_>>();
      println!("  {:>4}: {}", r, cells.join(" "));
    }
  }

  Ok(())
}

fn print_usage(prog: String, opts: Options) {
  let brief = format!("Usage: {} [options] MANIFEST", prog);
  print!("{}", opts.usage(&brief));
}
