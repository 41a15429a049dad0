use regex::Regex;

/// One segment of an `only` selector.
#[derive(Debug, Clone)]
pub enum Selector {
    /// Matches a test name exactly.
    Name(String),
    /// Matches any test name the pattern finds a match in.
    Pattern(Regex),
}

impl Selector {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Selector::Name(expected) => expected == name,
            Selector::Pattern(re) => re.is_match(name),
        }
    }
}

impl From<&str> for Selector {
    fn from(name: &str) -> Self {
        Selector::Name(name.to_string())
    }
}

impl From<String> for Selector {
    fn from(name: String) -> Self {
        Selector::Name(name)
    }
}

impl From<Regex> for Selector {
    fn from(re: Regex) -> Self {
        Selector::Pattern(re)
    }
}

/// A selector path, matched segment by segment against test names,
/// starting below the node that registered it.
#[derive(Debug, Clone)]
pub struct SelectorPath {
    segments: Vec<Selector>,
}

impl SelectorPath {
    pub(crate) fn new(segments: Vec<Selector>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Selector] {
        &self.segments
    }

    /// Decides whether a node at `relative` (names below the registering
    /// node) is kept.
    ///
    /// Groups on the way to a match are kept so the path renders; the match
    /// itself and everything below it are kept. A leaf shallower than the
    /// selector can never contain the target and is dropped.
    pub fn admits<S: AsRef<str>>(&self, relative: &[S], is_leaf: bool) -> bool {
        if is_leaf && relative.len() < self.segments.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(relative)
            .all(|(selector, name)| selector.matches(name.as_ref()))
    }
}

/// Selectors registered on one node, together with the depth of that node.
#[derive(Debug, Clone)]
pub(crate) struct Filter {
    pub depth: usize,
    pub paths: Vec<SelectorPath>,
}

impl Filter {
    /// A node passes when any registered path admits it.
    pub fn admits<S: AsRef<str>>(&self, names: &[S], is_leaf: bool) -> bool {
        let relative = names.get(self.depth..).unwrap_or(&[]);
        self.paths.iter().any(|path| path.admits(relative, is_leaf))
    }
}
