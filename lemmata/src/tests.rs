//! lemmataのテストモジュール群
//!
//! ソーステキストから語彙ストアを作り、辞書と複合語分解器を通して引くまでの
//! 一連の動作を検証します。

mod grammar;
