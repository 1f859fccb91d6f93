use criterion::{Criterion, black_box, criterion_group, criterion_main};

use chunkparse::{ChartParser, RuleSet, Sentence};

const GRAMMAR_SRC: &str = include_str!("./chunks.gram");

const SIMPLE: &str = "el el DA0MS0\ngato gato NCMS000\nduerme dormir VMIP3S0";

const COMPLEX: &str = "el el DA0MS0\n\
                       gato gato NCMS000\n\
                       negro negro AQ0MS0\n\
                       de de SPS00\n\
                       la el DA0FS0\n\
                       casa casa NCFS000\n\
                       ha haber VAIP3S0\n\
                       comido comer VMP00SM\n\
                       en en SPS00\n\
                       la el DA0FS0\n\
                       cocina cocina NCFS000\n\
                       grande grande AQ0CS0\n\
                       y y CC\n\
                       luminosa luminoso AQ0FS0\n\
                       . . Fp";

fn parse(parser: &ChartParser<RuleSet>, text: &str) -> usize {
  let mut s = Sentence::from_tagged("1", text).unwrap();
  parser.analyze(&mut s).unwrap();
  s.parse_tree(0).map(|t| t.iter().count()).unwrap_or(0)
}

fn criterion_benchmark(c: &mut Criterion) {
  let parser = ChartParser::new(GRAMMAR_SRC.parse::<RuleSet>().unwrap());

  c.bench_function("parse simple", |b| {
    b.iter(|| parse(black_box(&parser), black_box(SIMPLE)))
  });

  c.bench_function("parse complex", |b| {
    b.iter(|| parse(black_box(&parser), black_box(COMPLEX)))
  });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
