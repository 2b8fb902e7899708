//! Test case discovery and input/output naming conventions.

use std::{
    cmp::Ordering,
    path::{Path, PathBuf},
};

use crate::error::Error;

/// A single test case: one input file paired with one expected-output file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestCase {
    /// Path to the file fed to the command's standard input.
    pub input_path: PathBuf,
    /// Path to the file holding the expected standard output.
    pub expected_output_path: PathBuf,
    /// Whether the expected-output file is to be created rather than read.
    pub generate: bool,
}

impl TestCase {
    /// Creates a test case for the given input file, deriving its expected-output path.
    pub fn new(input_path: PathBuf, generate: bool) -> Self {
        let expected_output_path = expected_output_path_for(&input_path);
        Self {
            input_path,
            expected_output_path,
            generate,
        }
    }

    /// Checks that the expected-output file is in the state required by this test's mode:
    /// present when comparing, absent when generating.
    pub fn check_expected_output(&self) -> Result<(), Error> {
        let exists = self.expected_output_path.exists();

        if self.generate && exists {
            Err(Error::ExpectedOutputExists(
                self.expected_output_path.clone(),
            ))
        } else if !self.generate && !exists {
            Err(Error::ExpectedOutputMissing(
                self.expected_output_path.clone(),
            ))
        } else {
            Ok(())
        }
    }
}

/// Returns whether the given path follows the input-file naming convention: the path ends
/// with `.in`, or its file name starts with `in` or contains `.in.`.
pub fn is_input_file_name(path: &Path) -> bool {
    let path_str = path.to_string_lossy();
    let file_name = file_name_of(&path_str);

    path_str.ends_with(".in") || file_name.starts_with("in") || file_name.contains(".in.")
}

/// Derives the expected-output path paired with an input path.
///
/// The substitutions are layered and all of them that match are applied, in order:
///
/// 1. a trailing `.in` becomes `.out`;
/// 2. a leading `in` in the file name becomes `out`;
/// 3. every `/in/` directory component becomes `/out/`;
/// 4. every `.in.` becomes `.out.`.
pub fn expected_output_path_for(input_path: &Path) -> PathBuf {
    let mut output = input_path.to_string_lossy().into_owned();

    if let Some(stem) = output.strip_suffix(".in") {
        output = std::format!("{stem}.out");
    }

    let (dir, file_name) = split_file_name(&output);
    if let Some(rest) = file_name.strip_prefix("in") {
        output = std::format!("{dir}out{rest}");
    }

    output = output.replace("/in/", "/out/");
    output = output.replace(".in.", ".out.");

    PathBuf::from(output)
}

/// Discovers the test cases named by the given paths, in order.
///
/// Directories are walked depth-first, visiting entries in natural sort order. Files not
/// following the input naming convention are skipped. A path that does not exist is an
/// error, unless `generate` is set, in which case it is taken as a test as-is.
pub fn discover_tests<P: AsRef<Path>>(paths: &[P], generate: bool) -> Result<Vec<TestCase>, Error> {
    let mut tests = vec![];

    for path in paths {
        let path = path.as_ref();

        if path.is_dir() {
            let walker = walkdir::WalkDir::new(path)
                .follow_links(true)
                .sort_by(|left, right| {
                    natural_cmp(
                        &left.file_name().to_string_lossy(),
                        &right.file_name().to_string_lossy(),
                    )
                });

            for entry in walker {
                let entry = entry?;
                if entry.file_type().is_dir() {
                    continue;
                }

                push_if_input(&mut tests, entry.into_path(), generate);
            }
        } else if path.exists() || generate {
            push_if_input(&mut tests, path.to_path_buf(), generate);
        } else {
            return Err(Error::TestPathNotFound(path.to_path_buf()));
        }
    }

    Ok(tests)
}

fn push_if_input(tests: &mut Vec<TestCase>, path: PathBuf, generate: bool) {
    if is_input_file_name(&path) {
        tracing::debug!(target: "discover", "found test: {}", path.display());
        tests.push(TestCase::new(path, generate));
    } else {
        tracing::debug!(target: "discover", "skipping non-test file: {}", path.display());
    }
}

/// Compares two names in natural order: embedded runs of digits are compared by numeric
/// value, everything else case-insensitively. Names that compare equal on that basis are
/// ordered by their raw text.
pub fn natural_cmp(left: &str, right: &str) -> Ordering {
    let mut left_chunks = NaturalChunks { remaining: left };
    let mut right_chunks = NaturalChunks { remaining: right };

    loop {
        match (left_chunks.next(), right_chunks.next()) {
            (None, None) => return left.cmp(right),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ordering = l.cmp(&r);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

/// A maximal run of either digits or non-digits within a name.
#[derive(Debug, PartialEq, Eq)]
enum NaturalChunk<'a> {
    Number(&'a str),
    Text(String),
}

impl Ord for NaturalChunk<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(l), Self::Number(r)) => {
                // Compare by magnitude without parsing, so arbitrarily long runs work.
                let l = l.trim_start_matches('0');
                let r = r.trim_start_matches('0');
                l.len().cmp(&r.len()).then_with(|| l.cmp(r))
            }
            (Self::Text(l), Self::Text(r)) => l.cmp(r),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for NaturalChunk<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct NaturalChunks<'a> {
    remaining: &'a str,
}

impl<'a> Iterator for NaturalChunks<'a> {
    type Item = NaturalChunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.remaining.chars().next()?;
        let is_digit = first.is_ascii_digit();

        let end = self
            .remaining
            .find(|c: char| c.is_ascii_digit() != is_digit)
            .unwrap_or(self.remaining.len());

        let (chunk, rest) = self.remaining.split_at(end);
        self.remaining = rest;

        if is_digit {
            Some(NaturalChunk::Number(chunk))
        } else {
            Some(NaturalChunk::Text(chunk.to_lowercase()))
        }
    }
}

fn file_name_of(path: &str) -> &str {
    split_file_name(path).1
}

/// Splits a path string into the directory prefix (including its trailing separator) and
/// the final component.
fn split_file_name(path: &str) -> (&str, &str) {
    path.rfind('/')
        .map_or(("", path), |index| path.split_at(index + 1))
}

#[cfg(test)]
#[allow(clippy::panic_in_result_fn)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use pretty_assertions::{assert_eq, assert_matches};

    fn out(input: &str) -> String {
        expected_output_path_for(Path::new(input))
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn output_path_derivation() {
        assert_eq!(out("foo.in"), "foo.out");
        assert_eq!(out("in_a.txt"), "out_a.txt");
        assert_eq!(out("dir/in/case1"), "dir/out/case1");
        assert_eq!(out("x.in.1"), "x.out.1");
        assert_eq!(out("tests/in3.txt"), "tests/out3.txt");
    }

    #[test]
    fn output_path_derivation_layers_substitutions() {
        // Suffix, then prefix.
        assert_eq!(out("in.in"), "out.out");
        // Prefix, then directory component.
        assert_eq!(out("a/in/in1"), "a/out/out1");
        // Suffix, then directory component, then infix.
        assert_eq!(out("a/in/b.in.c.in"), "a/out/b.out.c.out");
        // A directory named `in...` is left alone; only the file name is considered.
        assert_eq!(out("inputs/1.in"), "inputs/1.out");
    }

    #[test]
    fn input_naming_convention() {
        assert!(is_input_file_name(Path::new("t/1.in")));
        assert!(is_input_file_name(Path::new("t/in1")));
        assert!(is_input_file_name(Path::new("t/a.in.1")));
        assert!(!is_input_file_name(Path::new("t/1.out")));
        assert!(!is_input_file_name(Path::new("in/case1")));
        assert!(!is_input_file_name(Path::new("t/main.cpp")));
    }

    #[test]
    fn natural_ordering() {
        let mut names = vec!["t2", "t10", "t1"];
        names.sort_by(|l, r| natural_cmp(l, r));
        assert_eq!(names, vec!["t1", "t2", "t10"]);

        let mut names = vec!["B.in", "a10.in", "a9.in", "a09x.in", "10", "9"];
        names.sort_by(|l, r| natural_cmp(l, r));
        assert_eq!(names, vec!["9", "10", "a9.in", "a09x.in", "a10.in", "B.in"]);
    }

    #[test]
    fn natural_ordering_is_total_on_ties() {
        assert_eq!(natural_cmp("a01", "a1"), Ordering::Less);
        assert_eq!(natural_cmp("A", "a"), Ordering::Less);
        assert_eq!(natural_cmp("x", "x"), Ordering::Equal);
    }

    #[test]
    fn discovery_recurses_in_natural_order() -> anyhow::Result<()> {
        let dir = assert_fs::TempDir::new()?;
        for name in ["10.in", "2.in", "1.in", "2.out", "notes.txt", "sub/in1", "sub/in2.txt"] {
            dir.child(name).touch()?;
        }

        let tests = discover_tests(&[dir.path()], false)?;
        let names: Vec<_> = tests
            .iter()
            .map(|t| {
                t.input_path
                    .strip_prefix(dir.path())
                    .map(|p| p.to_string_lossy().into_owned())
            })
            .collect::<Result<_, _>>()?;

        assert_eq!(names, vec!["1.in", "2.in", "10.in", "sub/in1", "sub/in2.txt"]);
        assert_eq!(
            tests[3].expected_output_path,
            dir.path().join("sub/out1")
        );
        Ok(())
    }

    #[test]
    fn discovery_preserves_argument_order() -> anyhow::Result<()> {
        let dir = assert_fs::TempDir::new()?;
        dir.child("b.in").touch()?;
        dir.child("a.in").touch()?;

        let tests = discover_tests(&[dir.path().join("b.in"), dir.path().join("a.in")], false)?;
        assert_eq!(tests[0].input_path, dir.path().join("b.in"));
        assert_eq!(tests[1].input_path, dir.path().join("a.in"));
        Ok(())
    }

    #[test]
    fn missing_paths_are_errors_unless_generating() -> anyhow::Result<()> {
        let dir = assert_fs::TempDir::new()?;
        let missing = dir.path().join("nope.in");

        assert_matches!(
            discover_tests(&[&missing], false),
            Err(Error::TestPathNotFound(p)) if p == missing
        );

        let tests = discover_tests(&[&missing], true)?;
        assert_eq!(tests.len(), 1);
        assert!(tests[0].generate);
        Ok(())
    }

    #[test]
    fn expected_output_checks_follow_mode() -> anyhow::Result<()> {
        let dir = assert_fs::TempDir::new()?;
        dir.child("1.in").touch()?;
        dir.child("1.out").touch()?;
        dir.child("2.in").touch()?;

        let present = TestCase::new(dir.path().join("1.in"), false);
        let absent = TestCase::new(dir.path().join("2.in"), false);
        assert!(present.check_expected_output().is_ok());
        assert_matches!(
            absent.check_expected_output(),
            Err(Error::ExpectedOutputMissing(_))
        );

        let present = TestCase::new(dir.path().join("1.in"), true);
        let absent = TestCase::new(dir.path().join("2.in"), true);
        assert_matches!(
            present.check_expected_output(),
            Err(Error::ExpectedOutputExists(_))
        );
        assert!(absent.check_expected_output().is_ok());
        Ok(())
    }
}
