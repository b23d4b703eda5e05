use std::fmt;

use sdiff_value::{root_path, Inspect};
use tracing::{debug, warn};

use crate::config::{validate_template, DifferConfig};
use crate::engine::Walker;
use crate::error::DiffResult;
use crate::filter::{compile, compile_all, FilterMode, PathFilter};
use crate::rules::{Comparator, Rules, Sorter, TrimRule};
use crate::sink::{DiffSet, DiffSink, Difference};

// ---------------------------------------------------------------------------
// Differ
// ---------------------------------------------------------------------------

/// A diff session: configuration plus the differences found so far.
///
/// Configure once with the chainable setters, run [`Differ::compare`], then
/// query the results. Differences accumulate across comparisons until
/// [`Differ::reset`].
///
/// Setters that take patterns or templates validate them and return a
/// `Result`, so chains use `?`:
///
/// ```
/// use sdiff::Differ;
///
/// let mut differ = Differ::new().exclude([r"\.updated_at$"])?.with_max_depth(10);
/// differ.compare(&vec![1, 2, 3], &vec![1, 2, 4])?;
/// assert_eq!(differ.find("$[2]").unwrap().b, "4");
/// # Ok::<(), sdiff::DiffError>(())
/// ```
#[derive(Debug, Default)]
pub struct Differ {
    config: DifferConfig,
    filter: PathFilter,
    rules: Rules,
    diffs: DiffSet,
}

impl Differ {
    /// Create a session with the default configuration (depth limit 30, no
    /// filters).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session from an explicit configuration.
    pub fn with_config(config: DifferConfig) -> DiffResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &DifferConfig {
        &self.config
    }

    /// Set the maximum traversal depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    /// Set the line template used by [`Differ::render`]. It must contain
    /// exactly three `{}` slots: path, A value, B value.
    pub fn with_template(mut self, template: &str) -> DiffResult<Self> {
        validate_template(template)?;
        self.config.template = template.to_string();
        Ok(self)
    }

    /// Replace the exclude patterns: matching paths are not recorded.
    ///
    /// Has no effect once include patterns have been set.
    pub fn exclude<I, S>(mut self, patterns: I) -> DiffResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let compiled = compile_all(patterns)?;
        if !self.filter.set_excludes(compiled) {
            debug!("exclude patterns ignored: include patterns are set");
        }
        Ok(self)
    }

    /// Replace the include patterns: only matching paths are recorded.
    ///
    /// Disables exclude patterns for the rest of the session.
    pub fn include<I, S>(mut self, patterns: I) -> DiffResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.filter.set_includes(compile_all(patterns)?);
        Ok(self)
    }

    /// Add a custom comparator. Comparators are tried in insertion order.
    pub fn with_comparator(mut self, comparator: impl Comparator + 'static) -> Self {
        self.rules.add_comparator(Box::new(comparator));
        self
    }

    /// Add a sorter for order-insensitive sequence comparison. Sorters are
    /// tried in insertion order.
    pub fn with_sorter(mut self, sorter: impl Sorter + 'static) -> Self {
        self.rules.add_sorter(Box::new(sorter));
        self
    }

    /// Trim `cutset` characters from both ends of text at matching paths
    /// before comparing.
    pub fn with_trim(mut self, pattern: &str, cutset: &str) -> DiffResult<Self> {
        self.rules.add_trim(TrimRule::new(pattern, cutset)?);
        Ok(self)
    }

    /// Trim surrounding whitespace from text at matching paths before
    /// comparing.
    pub fn with_trim_space<I, S>(mut self, patterns: I) -> DiffResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.rules.add_trim_spaces(compile_all(patterns)?);
        Ok(self)
    }

    /// Compare two values of the same type.
    ///
    /// On error nothing from this comparison is kept; differences from
    /// earlier comparisons are untouched.
    pub fn compare<T: Inspect>(&mut self, a: &T, b: &T) -> DiffResult<&mut Self> {
        self.compare_dyn(a, b)
    }

    /// Compare two values whose types are only known at runtime. Values of
    /// different types fail with [`DiffError::TypeMismatch`](crate::DiffError::TypeMismatch).
    pub fn compare_dyn(&mut self, a: &dyn Inspect, b: &dyn Inspect) -> DiffResult<&mut Self> {
        let root = root_path(a);
        debug!(
            root = %root,
            max_depth = self.config.max_depth,
            filter = ?self.filter.mode(),
            custom_rules = !self.rules.is_empty(),
            "comparison started"
        );

        let mut sink = DiffSink::new(&self.filter);
        let walker = Walker::new(&self.rules, self.config.max_depth);
        if let Err(err) = walker.walk(a, b, &root, 0, &mut sink) {
            warn!(
                root = %root,
                error = %err,
                discarded = sink.len(),
                "comparison aborted"
            );
            return Err(err);
        }

        let found = sink.into_set();
        debug!(root = %root, found = found.len(), "comparison finished");
        self.diffs.extend(found);
        Ok(self)
    }

    /// Clear results, filters, comparators, sorters and trim rules. The depth
    /// limit and template are kept.
    pub fn reset(&mut self) -> &mut Self {
        self.diffs.clear();
        self.filter.clear();
        self.rules.clear();
        self
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The difference recorded at exactly `path`.
    pub fn find(&self, path: &str) -> Option<&Difference> {
        self.diffs.get(path)
    }

    /// All differences whose path matches the regular expression `pattern`.
    pub fn find_matching(&self, pattern: &str) -> DiffResult<Vec<&Difference>> {
        Ok(self.diffs.matching(&compile(pattern)?))
    }

    /// All differences, in the order they were first recorded.
    pub fn diffs(&self) -> &[Difference] {
        self.diffs.as_slice()
    }

    pub fn len(&self) -> usize {
        self.diffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }

    /// Current filter mode.
    pub fn filter_mode(&self) -> FilterMode {
        self.filter.mode()
    }

    /// Render every difference with the configured template, one per line.
    pub fn render(&self) -> String {
        self.diffs.render(&self.config.template)
    }
}

impl fmt::Display for Differ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiffError;
    use crate::rules::{FnComparator, FnSorter, Outcome};
    use sdiff_value::inspect_record;
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Clone, Debug, PartialEq)]
    struct Person {
        name: String,
        age: u32,
    }

    inspect_record!(Person { name, age });

    #[derive(Clone, Debug, PartialEq)]
    struct Post {
        title: String,
        comment: String,
        tags: Vec<String>,
        scores: Vec<i64>,
        author: Option<Box<Person>>,
        meta: HashMap<String, u32>,
    }

    inspect_record!(Post {
        title,
        comment,
        tags,
        scores,
        author,
        meta
    });

    fn person(name: &str, age: u32) -> Person {
        Person {
            name: name.into(),
            age,
        }
    }

    fn post() -> Post {
        Post {
            title: "hello".into(),
            comment: "hi".into(),
            tags: vec!["a".into(), "b".into(), "c".into()],
            scores: vec![3, 1, 2],
            author: Some(Box::new(person("Ada", 36))),
            meta: HashMap::from([("views".to_string(), 10)]),
        }
    }

    // -----------------------------------------------------------------------
    // 1. Equal values produce no differences
    // -----------------------------------------------------------------------
    #[test]
    fn equal_values_have_no_diffs() {
        let mut differ = Differ::new();
        differ.compare(&post(), &post()).unwrap();
        assert!(differ.is_empty());
        assert_eq!(differ.render(), "");
    }

    // -----------------------------------------------------------------------
    // 2. A single field difference is addressed by path
    // -----------------------------------------------------------------------
    #[test]
    fn record_field_difference() {
        let mut differ = Differ::new();
        differ
            .compare(&person("Alice", 30), &person("Bob", 30))
            .unwrap();
        assert_eq!(differ.len(), 1);
        assert_eq!(
            differ.find("Person.name"),
            Some(&Difference::new("Person.name", "Alice", "Bob"))
        );
    }

    // -----------------------------------------------------------------------
    // 3. Nested paths through options, boxes, sequences and maps
    // -----------------------------------------------------------------------
    #[test]
    fn nested_paths() {
        let a = post();
        let mut b = post();
        b.author.as_mut().unwrap().age = 37;
        b.tags[2] = "z".into();
        b.meta.insert("views".into(), 11);

        let mut differ = Differ::new();
        differ.compare(&a, &b).unwrap();
        let paths: Vec<_> = differ.diffs().iter().map(|d| d.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["Post.tags[2]", "Post.author.age", "Post.meta[views]"]
        );
    }

    // -----------------------------------------------------------------------
    // 4. Presence mismatch on an optional field
    // -----------------------------------------------------------------------
    #[test]
    fn optional_presence_mismatch() {
        let a = post();
        let mut b = post();
        b.author = None;
        let mut differ = Differ::new();
        differ.compare(&a, &b).unwrap();
        assert_eq!(
            differ.diffs(),
            &[Difference::new("Post.author", "<not nil>", "<nil>")]
        );
    }

    // -----------------------------------------------------------------------
    // 5. Sequence length mismatch
    // -----------------------------------------------------------------------
    #[test]
    fn sequence_length_mismatch() {
        let mut differ = Differ::new();
        differ.compare(&vec![1, 2, 3], &vec![1, 2]).unwrap();
        assert_eq!(differ.diffs(), &[Difference::new("$[Length]", "3", "2")]);
    }

    // -----------------------------------------------------------------------
    // 6. Map size and value mismatch
    // -----------------------------------------------------------------------
    #[test]
    fn map_size_and_value_mismatch() {
        let a = json!({"x": 1});
        let b = json!({"x": 2, "y": 3});
        let mut differ = Differ::new();
        differ.compare(&a, &b).unwrap();
        assert_eq!(
            differ.diffs(),
            &[
                Difference::new("Value[Length]", "1", "2"),
                Difference::new("Value[x]", "1", "2"),
            ]
        );
        assert!(differ.find("Value[y]").is_none());
    }

    // -----------------------------------------------------------------------
    // 7. Include filter
    // -----------------------------------------------------------------------
    #[test]
    fn include_only_records_matching_paths() {
        let mut differ = Differ::new().include([r"^Person\.name$"]).unwrap();
        differ
            .compare(&person("Alice", 30), &person("Bob", 31))
            .unwrap();
        assert_eq!(differ.len(), 1);
        assert!(differ.find("Person.name").is_some());
        assert_eq!(differ.filter_mode(), FilterMode::Include);
    }

    // -----------------------------------------------------------------------
    // 8. Exclude filter, and excludes after includes are inert
    // -----------------------------------------------------------------------
    #[test]
    fn exclude_and_precedence() {
        let mut differ = Differ::new().exclude([r"\.age$"]).unwrap();
        differ
            .compare(&person("Alice", 30), &person("Bob", 31))
            .unwrap();
        assert_eq!(differ.len(), 1);
        assert!(differ.find("Person.age").is_none());

        let mut differ = Differ::new()
            .include(["age"])
            .unwrap()
            .exclude(["age"])
            .unwrap();
        differ
            .compare(&person("Alice", 30), &person("Bob", 31))
            .unwrap();
        assert_eq!(differ.len(), 1);
        assert!(differ.find("Person.age").is_some());
    }

    // -----------------------------------------------------------------------
    // 9. Trim-space rules only apply to matched paths
    // -----------------------------------------------------------------------
    #[test]
    fn trim_space_on_matched_path_only() {
        let a = post();
        let mut b = post();
        b.comment = "hi ".into();
        b.title = "hello ".into();

        let mut differ = Differ::new().with_trim_space([r"\.comment$"]).unwrap();
        differ.compare(&a, &b).unwrap();
        assert_eq!(
            differ.diffs(),
            &[Difference::new("Post.title", "hello", "hello ")]
        );
    }

    // -----------------------------------------------------------------------
    // 10. Cutset trim rules record the untrimmed originals
    // -----------------------------------------------------------------------
    #[test]
    fn trim_cutset_keeps_original_renderings() {
        let mut differ = Differ::new().with_trim(r"\.name$", "#").unwrap();
        differ
            .compare(&person("#Ann#", 1), &person("Ann", 1))
            .unwrap();
        assert!(differ.is_empty());

        differ
            .compare(&person("#Ann#", 1), &person("Bob", 1))
            .unwrap();
        assert_eq!(
            differ.find("Person.name"),
            Some(&Difference::new("Person.name", "#Ann#", "Bob"))
        );
    }

    // -----------------------------------------------------------------------
    // 11. Sorter makes order irrelevant and leaves inputs untouched
    // -----------------------------------------------------------------------
    #[test]
    fn sorter_compares_disordered_sequences() {
        let a = post();
        let mut b = post();
        b.scores = vec![2, 3, 1];
        let before = b.clone();

        let mut differ = Differ::new().with_sorter(
            FnSorter::new(r"\.scores$", |x: &i64, y: &i64| x.cmp(y)).unwrap(),
        );
        differ.compare(&a, &b).unwrap();
        assert!(differ.is_empty());
        assert_eq!(a.scores, vec![3, 1, 2]);
        assert_eq!(b, before);
    }

    // -----------------------------------------------------------------------
    // 12. Comparator outcomes
    // -----------------------------------------------------------------------
    #[test]
    fn comparator_overrides_descent() {
        let tolerant = FnComparator::new(r"\.age$", |x: &u32, y: &u32| {
            if x.abs_diff(*y) <= 1 {
                Outcome::NoDiff
            } else {
                Outcome::element(format!("~{x}"), format!("~{y}"))
            }
        })
        .unwrap();
        let mut differ = Differ::new().with_comparator(tolerant);

        differ.compare(&person("A", 30), &person("A", 31)).unwrap();
        assert!(differ.is_empty());

        differ.compare(&person("A", 30), &person("A", 40)).unwrap();
        assert_eq!(
            differ.diffs(),
            &[Difference::new("Person.age.$[customized]", "~30", "~40")]
        );
    }

    #[test]
    fn comparator_length_and_presence_outcomes() {
        let by_len = FnComparator::new(r"\.tags$", |x: &Vec<String>, y: &Vec<String>| {
            if x.len() == y.len() {
                Outcome::NoDiff
            } else {
                Outcome::Length
            }
        })
        .unwrap();
        let by_presence = FnComparator::new(r"\.author$", |x: &Option<Box<Person>>, y: &Option<Box<Person>>| {
            if x.is_some() == y.is_some() {
                Outcome::NoDiff
            } else {
                Outcome::Presence
            }
        })
        .unwrap();

        let a = post();
        let mut b = post();
        b.tags.push("d".into());
        b.author = None;

        let mut differ = Differ::new()
            .with_comparator(by_len)
            .with_comparator(by_presence);
        differ.compare(&a, &b).unwrap();
        assert_eq!(
            differ.diffs(),
            &[
                Difference::new("Post.tags.$[customized][Length]", "3", "4"),
                Difference::new("Post.author.$[customized]", "<not nil>", "<nil>"),
            ]
        );
    }

    #[test]
    fn comparator_contract_violations_are_fatal() {
        let bogus = FnComparator::new(r"\.age$", |_: &u32, _: &u32| Outcome::Length).unwrap();
        let mut differ = Differ::new().with_comparator(bogus);
        let err = differ
            .compare(&person("A", 1), &person("A", 2))
            .unwrap_err();
        assert!(matches!(
            err,
            DiffError::ProtocolViolation { ref path, .. } if path == "Person.age.$[customized]"
        ));

        let wrong_type = FnComparator::new(r"\.age$", |_: &String, _: &String| Outcome::NoDiff).unwrap();
        let mut differ = Differ::new().with_comparator(wrong_type);
        assert!(matches!(
            differ.compare(&person("A", 1), &person("A", 2)),
            Err(DiffError::ProtocolViolation { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // 13. Depth limit
    // -----------------------------------------------------------------------
    #[test]
    fn depth_limit_is_fatal() {
        let mut differ = Differ::new().with_max_depth(0);
        let err = differ
            .compare(&person("A", 1), &person("B", 1))
            .unwrap_err();
        assert_eq!(
            err,
            DiffError::DepthExceeded {
                path: "Person.name".into(),
                limit: 0
            }
        );
        assert!(differ.is_empty());
    }

    // -----------------------------------------------------------------------
    // 14. Type mismatch at the top level
    // -----------------------------------------------------------------------
    #[test]
    fn type_mismatch_is_fatal() {
        let mut differ = Differ::new();
        let err = differ.compare_dyn(&1u32, &"1").unwrap_err();
        assert!(matches!(err, DiffError::TypeMismatch { .. }));
        assert!(differ.is_empty());
    }

    // -----------------------------------------------------------------------
    // 15. Failed comparisons keep earlier results and add nothing
    // -----------------------------------------------------------------------
    #[test]
    fn failed_comparison_is_not_partially_recorded() {
        let mut differ = Differ::new();
        differ.compare(&1u8, &2u8).unwrap();

        let a = json!({"a": "x", "b": 1});
        let b = json!({"a": "y", "b": "1"});
        assert!(differ.compare(&a, &b).is_err());
        assert_eq!(differ.diffs(), &[Difference::new("u8", "1", "2")]);
    }

    // -----------------------------------------------------------------------
    // 16. Duplicate paths are last-write-wins
    // -----------------------------------------------------------------------
    #[test]
    fn duplicate_path_last_write_wins() {
        // A map key rendered as "Length" collides with the size-mismatch path.
        let a: HashMap<String, u32> = HashMap::from([("Length".to_string(), 7)]);
        let b: HashMap<String, u32> =
            HashMap::from([("Length".to_string(), 8), ("other".to_string(), 0)]);
        let mut differ = Differ::new();
        differ.compare(&a, &b).unwrap();
        assert_eq!(differ.len(), 1);
        assert_eq!(
            differ.find("$[Length]"),
            Some(&Difference::new("$[Length]", "7", "8"))
        );
    }

    // -----------------------------------------------------------------------
    // 17. Queries and rendering
    // -----------------------------------------------------------------------
    #[test]
    fn find_matching_and_render() {
        let mut differ = Differ::new()
            .with_template("Field: \"{}\", A: {}, B: {}")
            .unwrap();
        differ
            .compare(&vec![1, 2, 3], &vec![4, 2, 6])
            .unwrap();

        let found = differ.find_matching(r"^\$\[\d\]$").unwrap();
        assert_eq!(found.len(), 2);
        assert!(differ.find_matching("(").is_err());
        assert_eq!(
            differ.render(),
            "Field: \"$[0]\", A: 1, B: 4\nField: \"$[2]\", A: 3, B: 6\n"
        );
        assert_eq!(differ.to_string(), differ.render());
    }

    #[test]
    fn invalid_template_is_rejected() {
        assert!(matches!(
            Differ::new().with_template("{} {}"),
            Err(DiffError::InvalidTemplate(_))
        ));
        let config = DifferConfig {
            max_depth: 3,
            template: "{}".into(),
        };
        assert!(Differ::with_config(config).is_err());
    }

    // -----------------------------------------------------------------------
    // 18. Reset clears results and rules, keeps depth and template
    // -----------------------------------------------------------------------
    #[test]
    fn reset_semantics() {
        let mut differ = Differ::new()
            .with_max_depth(5)
            .with_template("{} | {} | {}")
            .unwrap()
            .include(["nothing-matches"])
            .unwrap()
            .with_trim_space(["name"])
            .unwrap();
        differ
            .compare(&person("A", 1), &person("B", 2))
            .unwrap();
        assert!(differ.is_empty());

        differ.reset();
        assert_eq!(differ.filter_mode(), FilterMode::All);
        assert_eq!(differ.config().max_depth, 5);

        differ
            .compare(&person("A ", 1), &person("A", 1))
            .unwrap();
        assert_eq!(differ.render(), "Person.name | A  | A\n");
    }

    // -----------------------------------------------------------------------
    // 19. Results accumulate across comparisons
    // -----------------------------------------------------------------------
    #[test]
    fn results_accumulate() {
        let mut differ = Differ::new();
        differ.compare(&person("A", 1), &person("B", 1)).unwrap();
        differ.compare(&person("A", 1), &person("A", 2)).unwrap();
        assert_eq!(differ.len(), 2);
    }

    #[test]
    fn optional_map_presence_mismatch() {
        struct Settings {
            limits: Option<HashMap<String, u32>>,
        }
        inspect_record!(Settings { limits });

        let a = Settings {
            limits: Some(HashMap::from([("rps".to_string(), 10)])),
        };
        let b = Settings { limits: None };
        let mut differ = Differ::new();
        differ.compare(&a, &b).unwrap();
        assert_eq!(
            differ.diffs(),
            &[Difference::new("Settings.limits", "<not nil>", "<nil>")]
        );
    }

    #[test]
    fn json_integers_beyond_f64_precision_differ() {
        let mut differ = Differ::new();
        differ
            .compare(
                &json!({"id": 9_007_199_254_740_993u64}),
                &json!({"id": 9_007_199_254_740_992u64}),
            )
            .unwrap();
        assert_eq!(
            differ.diffs(),
            &[Difference::new(
                "Value[id]",
                "9007199254740993",
                "9007199254740992"
            )]
        );

        differ.reset();
        differ.compare(&json!({"n": 1}), &json!({"n": 1.0})).unwrap();
        assert!(differ.is_empty());
    }

    #[test]
    fn differ_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Differ>();
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[test]
        fn prop_equal_values_never_differ() {
            proptest!(|(
                names in prop::collection::vec("[a-z ]{0,8}", 0..6),
                ages in prop::collection::vec(any::<u32>(), 0..6),
            )| {
                let people: Vec<Person> = names
                    .iter()
                    .zip(&ages)
                    .map(|(n, &a)| person(n, a))
                    .collect();
                let mut differ = Differ::new();
                differ.compare(&people, &people.clone()).unwrap();
                prop_assert!(differ.is_empty());
            });
        }

        #[test]
        fn prop_sorted_permutations_never_differ() {
            proptest!(|(
                items in prop::collection::vec(any::<i32>(), 0..20),
                seed in any::<u64>(),
            )| {
                let mut shuffled = items.clone();
                // Deterministic rotation plus reversal stands in for a shuffle.
                if !shuffled.is_empty() {
                    let k = (seed as usize) % shuffled.len();
                    shuffled.rotate_left(k);
                    if seed % 2 == 0 {
                        shuffled.reverse();
                    }
                }
                let before = shuffled.clone();

                let mut differ = Differ::new()
                    .with_sorter(FnSorter::new("^\\$$", |x: &i32, y: &i32| x.cmp(y)).unwrap());
                differ.compare(&items, &shuffled).unwrap();
                prop_assert!(differ.is_empty());
                prop_assert_eq!(shuffled, before);
            });
        }

        #[test]
        fn prop_include_admits_only_matching_paths() {
            proptest!(|(
                a in prop::collection::vec(0u8..4, 0..12),
                b in prop::collection::vec(0u8..4, 0..12),
            )| {
                let mut differ = Differ::new().include([r"\[[02468]\]$"]).unwrap();
                differ.compare(&a, &b).unwrap();
                let pattern = regex::Regex::new(r"\[[02468]\]$").unwrap();
                for diff in differ.diffs() {
                    prop_assert!(pattern.is_match(&diff.path), "unexpected path {}", diff.path);
                }
            });
        }
    }
}
