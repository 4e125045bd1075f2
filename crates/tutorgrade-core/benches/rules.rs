use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tutorgrade_core::evaluator::{evaluate, Thresholds};
use tutorgrade_core::model::DifficultyTable;
use tutorgrade_core::parser::{parse_pedagogy_str, DocumentFormat};
use tutorgrade_core::statistics::{Performance, PerformanceRecord};

const PEDAGOGY: &str = r#"
feedback_rules:
  - name: hint_easy
    condition:
      type: and
      conditions:
        - type: less_than
          left: performance.topics.Topic1.percent_correct_by_difficulty.easy
          right: 60
        - type: greater_than
          left: performance.topics.Topic1.total_questions
          right: 2
    action: provide_hint('Topic1')
  - name: visualize_hard
    condition:
      type: or
      conditions:
        - type: less_than
          left: performance.topics.Topic2.percent_correct_hard_questions
          right: 40
        - type: equal
          left: performance.areas.Physics.points
          right: 0
    action: suggest_visualization('Topic2')
"#;

fn make_performance(topics: usize) -> Performance {
    let record = |pct: f64| PerformanceRecord {
        total_questions: 6,
        points: 5,
        percent_correct: pct,
        percent_correct_by_difficulty: DifficultyTable {
            easy: pct,
            medium: pct,
            hard: pct,
        },
    };
    let mut performance = Performance::default();
    for i in 0..topics {
        performance
            .topics
            .insert(format!("Topic{i}"), record((i * 7 % 100) as f64));
    }
    for area in ["Biology", "Physics"] {
        performance.areas.insert(area.into(), record(45.0));
    }
    performance
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    let (pedagogy, _) = parse_pedagogy_str(PEDAGOGY, DocumentFormat::Yaml).unwrap();
    let thresholds = Thresholds::default();

    for topics in [10, 100] {
        let performance = make_performance(topics);
        group.bench_function(format!("{topics}_topics"), |b| {
            b.iter(|| {
                evaluate(
                    black_box(&performance),
                    black_box(&pedagogy.rules),
                    black_box(&thresholds),
                )
            })
        });
    }

    group.finish();
}

fn bench_parse_pedagogy(c: &mut Criterion) {
    c.bench_function("parse_pedagogy_yaml", |b| {
        b.iter(|| parse_pedagogy_str(black_box(PEDAGOGY), DocumentFormat::Yaml))
    });
}

criterion_group!(benches, bench_evaluate, bench_parse_pedagogy);
criterion_main!(benches);
