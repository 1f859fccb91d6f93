use std::env;
use std::io;
use std::io::{BufRead, Write};
use std::process;

use tracing_subscriber::EnvFilter;

use chunkparse::{Chart, ChartParser, Err, RuleSet, Sentence};

fn usage(prog_name: &str) -> String {
  format!(
    r"Usage: {} GRAMMAR [options]

Reads tagged sentences from stdin, one token per line as
`form lemma tag [lemma tag ...]`, with a blank line after each sentence.

Options:
  -h, --help    Print this message
  -c, --chart   Print the chart of the first tag sequence (defaults to not printing)

Set RUST_LOG (e.g. RUST_LOG=chunkparse=debug) to see parser logs.",
    prog_name
  )
}

fn parse(parser: &ChartParser<RuleSet>, id: usize, text: &str, print_chart: bool) -> Result<(), Err> {
  let mut sentence = Sentence::from_tagged(id.to_string(), text)?;
  if sentence.is_empty() {
    return Ok(());
  }

  if print_chart {
    let mut chart = Chart::new(parser.grammar());
    chart.load_sentence(&sentence, 0);
    chart.parse()?;
    println!("chart:\n{}", chart);
  }

  parser.analyze(&mut sentence)?;

  for k in 0..sentence.num_kbest() {
    if let Some(tree) = sentence.parse_tree(k) {
      if sentence.num_kbest() > 1 {
        println!("sequence {}:", k);
      }
      println!("{}\n", tree);
    }
  }

  Ok(())
}

/// A bad sentence is logged and skipped, the rest of the input still runs.
fn parse_or_skip(parser: &ChartParser<RuleSet>, id: usize, text: &str, print_chart: bool) {
  if let Err(e) = parse(parser, id, text, print_chart) {
    tracing::error!(sentence = id, error = %e, "skipping sentence");
  }
}

struct Args {
  filename: String,
  print_chart: bool,
}

impl Args {
  fn make_error_message(msg: &str, prog_name: impl AsRef<str>) -> String {
    format!("argument error: {}.\n\n{}", msg, usage(prog_name.as_ref()))
  }

  fn parse(v: Vec<String>) -> Result<Self, String> {
    let mut iter = v.into_iter();
    let Some(prog_name) = iter.next() else {
      return Err(Self::make_error_message("bad argument vector", "chunkparse"));
    };

    let mut filename: Option<String> = None;
    let mut print_chart = false;

    for o in iter {
      if o == "-h" || o == "--help" {
        println!("{}", usage(&prog_name));
        process::exit(0);
      } else if o == "-c" || o == "--chart" {
        print_chart = true;
      } else if filename.is_none() {
        filename = Some(o);
      } else {
        return Err(Self::make_error_message("invalid arguments", prog_name));
      }
    }

    match filename {
      Some(filename) => Ok(Self {
        filename,
        print_chart,
      }),
      None => Err(Self::make_error_message("missing grammar file", prog_name)),
    }
  }
}

fn main() -> Result<(), Err> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(io::stderr)
    .init();

  let opts = match Args::parse(env::args().collect()) {
    Ok(opts) => opts,
    Err(msg) => {
      eprintln!("{}", msg);
      process::exit(255);
    }
  };

  let grammar = RuleSet::read_from_file(&opts.filename)?;
  tracing::info!(grammar = %opts.filename, rules = grammar.len(), "grammar loaded");
  let parser = ChartParser::new(grammar);

  let stdin = io::stdin();
  let mut block = String::new();
  let mut id = 1;
  for line in stdin.lock().lines() {
    let line = line?;
    if line.trim().is_empty() {
      if !block.is_empty() {
        parse_or_skip(&parser, id, &block, opts.print_chart);
        io::stdout().flush()?;
        block.clear();
        id += 1;
      }
    } else {
      block.push_str(&line);
      block.push('\n');
    }
  }

  if !block.is_empty() {
    parse_or_skip(&parser, id, &block, opts.print_chart);
  }

  Ok(())
}

#[test]
fn test_bad_sentence_is_skipped() {
  let parser = ChartParser::new("sn ==> +NN . @START S .".parse::<RuleSet>().unwrap());
  assert!(parse(&parser, 1, "cat cat", false).is_err());
  parse_or_skip(&parser, 1, "cat cat", false);
  assert!(parse(&parser, 2, "cat cat NN", false).is_ok());
}
