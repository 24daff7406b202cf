// This file is the module declaration file for the `builders` module.
// It declares and makes public the building blocks the engine is made of.

// `patterns` module:
// Name patterns (`NamePattern`, `MatchMode`) and the `NameMatcher` trait the
// walker applies to every entry, plus `LineRewrite`, the compiled
// select-then-replace rule used by the rewriter.
pub mod patterns;

// `remover` module:
// Deletes files and whole directory trees, children before parents, with
// fail-fast semantics inside a tree and best-effort semantics across a batch.
pub mod remover;

// `reporter` module:
// Prints walk, delete and rewrite results as text, JSON, YAML or TOML through
// the `Reporter` trait and its `ConsoleReporter` implementation.
pub mod reporter;

// `rewriter` module:
// Reads a file line by line, rewrites the selected lines, and writes the
// buffered result back over the original.
pub mod rewriter;

// `validator` module:
// `check_path`, the gate every operation passes its root through, and the
// `ConfigValidator` used to reject configurations the engine cannot honour.
pub mod validator;

// `walker` module:
// Depth-first, pre-order enumeration of files or directories under a root.
pub mod walker;
