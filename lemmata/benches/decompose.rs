//! 複合語分解とストア構築のベンチマーク
//!
//! 小さな語彙から合成した複合語の列を分解する速度と、ソーステキストから
//! 各バックエンドのストアを作り直す速度を計測します。

use std::path::Path;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use lemmata::config::{
    CompositumConfig, DictionaryConfig, LanguageConfig, SelectMode, TextFormat,
};
use lemmata::{Dictionary, Grammar, StoreRegistry};

const NOUNS: &[&str] = &[
    "haus", "tür", "schloss", "garten", "zaun", "wasser", "hahn", "stadt", "rand", "bahn",
    "hof", "brücke", "kopf", "stein", "weg", "feld", "wald", "see", "berg", "dorf",
];
const ADJECTIVES: &[&str] = &["klein", "groß", "alt", "neu", "hoch", "tief"];

fn lexicon() -> String {
    let mut text = String::new();
    for noun in NOUNS {
        text.push_str(&format!("{noun},#s\n"));
    }
    for adj in ADJECTIVES {
        text.push_str(&format!("{adj},#a\n"));
    }
    text
}

fn compounds() -> Vec<String> {
    let mut words = vec![];
    for fore in ADJECTIVES.iter().chain(NOUNS) {
        for aft in NOUNS {
            if fore != aft {
                words.push(format!("{fore}{aft}"));
            }
        }
    }
    words
}

fn language_config(dir: &Path, backend: &str) -> LanguageConfig {
    let source = dir.join("sys.txt");
    std::fs::write(&source, lexicon()).expect("Failed to write the lexicon");

    let mut config = LanguageConfig::default();
    config.store.backend = Some(backend.into());
    config.store.search_path = vec![dir.join("store")];
    config.morphology.infix = vec![("s".into(), "s/ n/".into())];
    config.insert_dictionary("sys-dic", DictionaryConfig::new(source, TextFormat::WordClass));
    config
}

fn bench_decompose(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("Failed to create a temporary directory");
    let config = language_config(dir.path(), "memory");
    let words = compounds();

    let mut group = c.benchmark_group("Decompose");
    group.throughput(Throughput::Elements(words.len() as u64));
    group.warm_up_time(Duration::from_secs(3));
    group.measurement_time(Duration::from_secs(10));

    group.bench_function(BenchmarkId::new("Cold", words.len()), |b| {
        b.iter_with_setup(
            || {
                let mut registry = StoreRegistry::new(config.clone());
                let dic = Dictionary::new(&mut registry, &["sys-dic"], SelectMode::All).unwrap();
                Grammar::new(dic, CompositumConfig::default())
            },
            |mut grammar| {
                for word in &words {
                    grammar.find_compound(word);
                }
            },
        );
    });

    let mut registry = StoreRegistry::new(config.clone());
    let dic = Dictionary::new(&mut registry, &["sys-dic"], SelectMode::All).unwrap();
    let mut grammar = Grammar::new(dic, CompositumConfig::default());
    group.bench_function(BenchmarkId::new("Memoized", words.len()), |b| {
        b.iter(|| {
            for word in &words {
                grammar.find_compound(word);
            }
        });
    });

    group.finish();
}

fn bench_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("Rebuild");
    group.sample_size(20);

    for backend in ["memory", "rkyv", "zstd"] {
        let dir = tempfile::tempdir().expect("Failed to create a temporary directory");
        let config = language_config(dir.path(), backend);
        let source = config.dictionaries["sys-dic"].name.clone();

        let mut padding = String::new();
        group.bench_function(BenchmarkId::new("Open", backend), |b| {
            b.iter_with_setup(
                || {
                    // ソースの大きさを変えて指紋を無効にする
                    padding.push('\n');
                    std::fs::write(&source, lexicon() + &padding).unwrap();
                    StoreRegistry::new(config.clone())
                },
                |mut registry| {
                    registry.open("sys-dic").unwrap();
                    registry.close_all().unwrap();
                },
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_decompose, bench_rebuild);
criterion_main!(benches);
