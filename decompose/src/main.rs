//! 単語を語彙項目に解決するユーティリティ
//!
//! このバイナリは、標準入力から読み込んだ単語を辞書で引き、見つからなければ
//! 複合語として分解して、指定された出力形式(lingo、lemma、detail)で結果を出力します。

use std::error::Error;
use std::io::{BufRead, BufWriter, IsTerminal, Write};
use std::path::PathBuf;
use std::str::FromStr;

use lemmata::config::{LanguageConfig, SelectMode};
use lemmata::{Dictionary, Grammar, StoreRegistry, Word};

use clap::Parser;

/// 出力モード
#[derive(Clone, Debug)]
enum OutputMode {
    Lingo,
    Lemma,
    Detail,
}

impl FromStr for OutputMode {
    type Err = &'static str;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode {
            "lingo" => Ok(Self::Lingo),
            "lemma" => Ok(Self::Lemma),
            "detail" => Ok(Self::Detail),
            _ => Err("Could not parse a mode"),
        }
    }
}

/// コマンドライン引数
#[derive(Parser, Debug)]
#[clap(name = "decompose", about = "Resolves words to lemmas and decomposes compounds")]
struct Args {
    /// Language configuration file (TOML).
    #[clap(short = 'c', long)]
    config: PathBuf,

    /// Dictionary ids consulted in order. All configured dictionaries are used if omitted.
    #[clap(short = 'd', long = "dictionary")]
    dictionaries: Vec<String>,

    /// Stops at the first dictionary that knows a word.
    #[clap(short = 'F', long)]
    first: bool,

    /// Output mode. Choices are lingo, lemma, and detail.
    #[clap(short = 'O', long, default_value = "lingo")]
    output_mode: OutputMode,

    /// Also prints the synonyms of each word.
    #[clap(short = 'y', long)]
    synonyms: bool,
}

/// 単語を辞書で引き、見つからなければ複合語として分解する
fn resolve(grammar: &mut Grammar, form: &str) -> Word {
    let word = grammar.dictionary_mut().find_word(form);
    if word.is_unknown() {
        grammar.find_compound(form)
    } else {
        word
    }
}

fn write_word<W: Write>(
    out: &mut W,
    grammar: &mut Grammar,
    word: &Word,
    args: &Args,
) -> std::io::Result<()> {
    match args.output_mode {
        OutputMode::Lingo => write!(out, "{word}")?,
        OutputMode::Lemma => {
            let lemmas = word.lemmas();
            if lemmas.is_empty() {
                out.write_all(word.form().to_lowercase().as_bytes())?;
            } else {
                out.write_all(lemmas.join(" ").as_bytes())?;
            }
        }
        OutputMode::Detail => {
            write!(out, "{}\t{}", word.form(), word.status().tag())?;
            for lex in word.lexicals() {
                write!(out, "\t{lex}@{}", lex.src().unwrap_or("-"))?;
            }
            if let Some(head) = word.head() {
                write!(out, "\thead={head}")?;
            }
        }
    }
    if args.synonyms {
        let synonyms = grammar.dictionary_mut().find_synonyms(word);
        if !synonyms.is_empty() {
            let shown: Vec<String> = synonyms.iter().map(|lex| lex.form().to_string()).collect();
            write!(out, "\tsyn={}", shown.join(","))?;
        }
    }
    out.write_all(b"\n")
}

/// メイン関数
///
/// 辞書を開き、標準入力の各行を空白で区切った単語ごとに解決して、
/// 指定された形式で結果を標準出力に出力します。
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = LanguageConfig::from_path(&args.config)?;
    let compositum = config.morphology.compositum.clone();
    let ids: Vec<String> = if args.dictionaries.is_empty() {
        config.dictionaries.keys().cloned().collect()
    } else {
        args.dictionaries.clone()
    };
    let mode = if args.first {
        SelectMode::First
    } else {
        SelectMode::All
    };

    log::info!("Loading the dictionaries...");
    let mut registry = StoreRegistry::new(config);
    let dic = Dictionary::new(&mut registry, &ids, mode)?;
    let mut grammar = Grammar::new(dic, compositum);
    log::info!("Ready to decompose");

    let is_tty = std::io::stdout().is_terminal();

    let out = std::io::stdout();
    let mut out = BufWriter::new(out.lock());
    for line in std::io::stdin().lock().lines() {
        let line = line?;
        for form in line.split_whitespace() {
            let word = resolve(&mut grammar, form);
            write_word(&mut out, &mut grammar, &word, &args)?;
        }
        if is_tty {
            out.flush()?;
        }
    }
    out.flush()?;

    for (id, stats) in grammar.dictionary().report() {
        log::debug!(
            "{id}: {} queries, {} cache hits, {} store hits, {} lexicals",
            stats.queries,
            stats.cache_hits,
            stats.store_hits,
            stats.lexicals
        );
    }
    let stats = grammar.report();
    log::debug!(
        "compounds: {} queries, {} memo hits, {} decomposed",
        stats.queries,
        stats.memo_hits,
        stats.compounds
    );

    registry.close_all()?;
    Ok(())
}
