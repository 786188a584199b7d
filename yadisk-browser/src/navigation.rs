use std::fmt;

/// Root-relative remote folder, one segment per level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderPath {
    segments: Vec<String>,
}

impl FolderPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Builds a path from a slash separated string such as `Docs/Reports`.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix("disk:").unwrap_or(raw);
        Self {
            segments: raw
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Path sent to the listing endpoint: `/` for root, `/A/B/` below it.
    pub fn listing_path(&self) -> String {
        let mut path = String::from("/");
        for segment in &self.segments {
            path.push_str(segment);
            path.push('/');
        }
        path
    }

    /// Remote path of a file named `name` inside this folder.
    pub fn destination_for(&self, name: &str) -> String {
        let mut path = self.listing_path();
        path.push_str(name);
        path
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

/// Current folder of the browser. Every change bumps `revision`, which is
/// what drives a listing refresh.
#[derive(Debug, Default)]
pub struct NavigationState {
    path: FolderPath,
    revision: u64,
}

impl NavigationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(path: FolderPath) -> Self {
        Self { path, revision: 0 }
    }

    pub fn path(&self) -> &FolderPath {
        &self.path
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Appends `name`; it is expected to be a directory from the current listing.
    pub fn descend_into(&mut self, name: &str) -> &FolderPath {
        self.path.segments.push(name.to_string());
        self.revision += 1;
        &self.path
    }

    /// Drops the last segment. Returns `false` at the root, where nothing changes.
    pub fn ascend(&mut self) -> bool {
        if self.path.segments.pop().is_none() {
            return false;
        }
        self.revision += 1;
        true
    }
}
