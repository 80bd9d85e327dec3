use crate::config::{CompositumConfig, SelectMode, TextFormat};
use crate::dictionary::Dictionary;
use crate::grammar::Grammar;
use crate::lexical::{Lexical, WordStatus};
use crate::test_utils::{TestEnv, strings};

const LEXICON: &str = "\
klein,#a
seite,#s
haus,#s
tür,#s
schloss,#s
türschloss,#k
hase,#s
nase,#s
";

fn grammar(compositum: CompositumConfig) -> Grammar {
    let mut env = TestEnv::new();
    env.add_source("sys-dic", "sys.txt", TextFormat::WordClass, LEXICON);
    env.config.morphology.infix = vec![("s".into(), "n/".into())];
    let mut registry = env.registry();
    let dic = Dictionary::new(&mut registry, &["sys-dic"], SelectMode::All).unwrap();
    Grammar::new(dic, compositum)
}

/// 二つの辞書語からなる複合語の分解を確認
#[test]
fn test_two_part_compound() {
    let mut grammar = grammar(CompositumConfig::default());
    let word = grammar.find_compound("Kleinseite");
    assert_eq!(word.status(), WordStatus::Compound);
    assert_eq!(
        word.lexicals(),
        &[
            Lexical::new("klein", "a+"),
            Lexical::new("seite", "s+"),
            Lexical::new("kleinseite", "k"),
        ]
    );
    assert_eq!(word.head(), Some(&Lexical::new("seite", "s+")));
    assert_eq!(word.lemmas(), ["klein", "seite", "kleinseite"]);
}

/// 接中辞規則で前部の連結要素が取り除かれることを確認
#[test]
fn test_infix_in_front_part() {
    let mut grammar = grammar(CompositumConfig::default());
    let word = grammar.find_compound("Hasennase");
    assert_eq!(
        word.to_string(),
        "<Hasennase|KOM = [(hase/s+), (nase/s+), (hasennase/k)]>"
    );
}

/// 構成要素数の上限を確認
#[test]
fn test_max_parts() {
    let compositum = CompositumConfig {
        min_word_size: 6,
        min_avg_part_size: 3,
        max_parts: 3,
        ..Default::default()
    };
    let mut three = grammar(compositum.clone());
    let word = three.find_compound("Haustürschloss");
    assert_eq!(
        word.to_string(),
        "<Haustürschloss|KOM = [(haus/s+), (tür/s+), (schloss/s+), (haustürschloss/k)]>"
    );

    let mut two = grammar(CompositumConfig {
        max_parts: 2,
        ..compositum
    });
    assert!(two.find_compound("Haustürschloss").is_unknown());
}

/// 最短語長が構成要素の再分解にも適用されることを確認
#[test]
fn test_min_word_size_applies_to_parts() {
    let compositum = CompositumConfig {
        min_avg_part_size: 3,
        max_parts: 3,
        ..Default::default()
    };
    let mut grammar = grammar(compositum);
    assert!(grammar.find_compound("Haustür").is_unknown());
    assert!(grammar.find_compound("Haustürschloss").is_unknown());
}

/// 複合語の品詞しか持たない部分は構成要素にならないことを確認
#[test]
fn test_compound_class_part() {
    let mut grammar = grammar(CompositumConfig {
        min_word_size: 6,
        min_avg_part_size: 3,
        ..Default::default()
    });
    let word = grammar.find_compound("Haustürschloss");
    assert_eq!(word.status(), WordStatus::Compound);
    assert!(
        word.lexicals()
            .iter()
            .all(|lex| lex.form() != "türschloss")
    );
    assert_eq!(word.head(), Some(&Lexical::new("schloss", "s+")));
}

/// ハイフンでは最後のハイフンだけで分割されることを確認
#[test]
fn test_hyphenated_compound() {
    let mut grammar = grammar(CompositumConfig::default());

    let word = grammar.find_compound("Klein-Seite");
    assert_eq!(
        word.lexicals(),
        &[
            Lexical::new("klein", "a+"),
            Lexical::new("seite", "s+"),
            Lexical::new("klein-seite", "k"),
        ]
    );

    let word = grammar.find_compound("Haus-Kleinseite");
    assert_eq!(
        word.lexicals(),
        &[
            Lexical::new("haus", "s+"),
            Lexical::new("klein", "a+"),
            Lexical::new("seite", "s+"),
            Lexical::new("haus-kleinseite", "k"),
        ]
    );
    assert_eq!(word.head(), Some(&Lexical::new("seite", "s+")));

    // ハイフンの位置を無視した分割(klein + seite)は試されない
    let word = grammar.find_compound("kle-inseite");
    assert_eq!(word.status(), WordStatus::Compound);
    assert_eq!(
        word.lexicals(),
        &[
            Lexical::new("kle", "x+"),
            Lexical::new("inseite", "x+"),
            Lexical::new("kle-inseite", "k"),
        ]
    );

    assert!(grammar.find_compound("kleinseite-").is_unknown());
}

/// しきい値による拒否を確認
#[test]
fn test_thresholds() {
    let mut grammar = self::grammar(CompositumConfig::default());
    assert!(grammar.find_compound("Haustür").is_unknown());

    let mut grammar = self::grammar(CompositumConfig {
        skip_sequences: strings(&["as"]),
        ..Default::default()
    });
    assert!(grammar.find_compound("Kleinseite").is_unknown());
    assert_eq!(grammar.find_compound("Hasennase").status(), WordStatus::Compound);

    let mut grammar = self::grammar(CompositumConfig {
        min_part_size: 6,
        ..Default::default()
    });
    assert!(grammar.find_compound("Kleinseite").is_unknown());
}

/// 分解結果がメモ化されることを確認
#[test]
fn test_memo() {
    let mut grammar = grammar(CompositumConfig::default());
    let a = grammar.find_compound("Kleinseite");
    let b = grammar.find_compound("KLEINSEITE");
    assert_eq!(a.lexicals(), b.lexicals());
    assert_eq!(b.form(), "KLEINSEITE");
    grammar.find_compound("Unbekanntes");
    grammar.find_compound("unbekanntes");

    let stats = grammar.report();
    assert_eq!(stats.queries, 4);
    assert_eq!(stats.memo_hits, 2);
    assert_eq!(stats.compounds, 1);
}
