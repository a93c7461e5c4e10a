use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Seek};
use std::path::{Path, PathBuf};

use rand::Rng;

use crate::foundation::error::{LabelError, LabelResult};

/// Source of raw background bytes, addressed by store-relative name.
///
/// Readers must be rewindable: the decoder sniffs a prefix and then decodes from the start.
pub trait BackgroundStore {
    type Reader: BufRead + Seek;

    fn open(&self, name: &str) -> LabelResult<Self::Reader>;
}

/// Filesystem directory of candidate backgrounds.
#[derive(Clone, Debug)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, name: &str) -> LabelResult<PathBuf> {
        let norm = normalize_rel_path(name)?;
        Ok(self.root.join(Path::new(&norm)))
    }
}

impl BackgroundStore for DirStore {
    type Reader = BufReader<File>;

    fn open(&self, name: &str) -> LabelResult<Self::Reader> {
        let path = self.path_for(name)?;
        let f = File::open(&path).map_err(|e| LabelError::not_found("background", &path, e))?;
        Ok(BufReader::new(f))
    }
}

/// In-memory store, handy for embedding backgrounds or for tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> &mut Self {
        self.files.insert(name.into(), bytes);
        self
    }
}

impl BackgroundStore for MemoryStore {
    type Reader = Cursor<Vec<u8>>;

    fn open(&self, name: &str) -> LabelResult<Self::Reader> {
        let norm = normalize_rel_path(name)?;
        self.files
            .get(&norm)
            .map(|b| Cursor::new(b.clone()))
            .ok_or_else(|| {
                LabelError::not_found(
                    "background",
                    norm,
                    std::io::Error::from(std::io::ErrorKind::NotFound),
                )
            })
    }
}

/// How a run picks its background.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackgroundPolicy {
    /// Always use this store-relative name.
    Fixed { name: String },
    /// Pick an index uniformly from `first..=last` and substitute it into `pattern`.
    ///
    /// `pattern` holds one placeholder, either `{}` or a zero-padded `{:0N}`.
    RandomNumbered {
        first: u32,
        last: u32,
        pattern: String,
    },
}

impl Default for BackgroundPolicy {
    fn default() -> Self {
        Self::RandomNumbered {
            first: 1,
            last: 9,
            pattern: "{:02}.jpg".to_string(),
        }
    }
}

impl BackgroundPolicy {
    pub fn validate(&self) -> LabelResult<()> {
        match self {
            Self::Fixed { name } => normalize_rel_path(name).map(|_| ()),
            Self::RandomNumbered {
                first,
                last,
                pattern,
            } => {
                if first > last {
                    return Err(LabelError::validation(format!(
                        "background range {first}..={last} is empty"
                    )));
                }
                format_numbered(pattern, *first).map(|_| ())
            }
        }
    }

    /// Store-relative name of the background this run should use.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> LabelResult<String> {
        match self {
            Self::Fixed { name } => Ok(name.clone()),
            Self::RandomNumbered {
                first,
                last,
                pattern,
            } => {
                if first > last {
                    return Err(LabelError::validation(format!(
                        "background range {first}..={last} is empty"
                    )));
                }
                let index = rng.random_range(*first..=*last);
                format_numbered(pattern, index)
            }
        }
    }
}

/// An opened background, not yet decoded.
#[derive(Debug)]
pub struct ResolvedBackground<R> {
    pub name: String,
    pub reader: R,
}

#[tracing::instrument(skip(store, rng))]
pub fn resolve_background<S, R>(
    store: &S,
    policy: &BackgroundPolicy,
    rng: &mut R,
) -> LabelResult<ResolvedBackground<S::Reader>>
where
    S: BackgroundStore,
    R: Rng + ?Sized,
{
    let name = policy.choose(rng)?;
    let reader = store.open(&name)?;
    tracing::info!(background = %name, "resolved background");
    Ok(ResolvedBackground { name, reader })
}

/// Read a whole font program from disk.
pub fn read_font_resource(path: &Path) -> LabelResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| LabelError::not_found("font", path, e))
}

/// Substitute `index` into the single `{}` / `{:0N}` placeholder of `pattern`.
pub fn format_numbered(pattern: &str, index: u32) -> LabelResult<String> {
    let bad = || {
        LabelError::validation(format!(
            "background pattern '{pattern}' needs one {{}} or {{:0N}} placeholder"
        ))
    };

    let open = pattern.find('{').ok_or_else(bad)?;
    let close = open + pattern[open..].find('}').ok_or_else(bad)?;
    let (head, rest) = (&pattern[..open], &pattern[close + 1..]);
    if rest.contains('{') || rest.contains('}') {
        return Err(bad());
    }

    let fmt = &pattern[open + 1..close];
    let digits = match fmt {
        "" => index.to_string(),
        s => {
            let width = s
                .strip_prefix(":0")
                .and_then(|w| w.parse::<usize>().ok())
                .ok_or_else(bad)?;
            format!("{index:0width$}")
        }
    };

    Ok(format!("{head}{digits}{rest}"))
}

/// Normalize and validate store-relative paths.
///
/// The result uses `/` separators and drops `.` segments; absolute paths and parent traversals
/// (`..`) are rejected.
pub fn normalize_rel_path(source: &str) -> LabelResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(LabelError::validation("background paths must be relative"));
    }
    if s.is_empty() {
        return Err(LabelError::validation("background path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(LabelError::validation(
                "background paths must not contain '..'",
            ));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(LabelError::validation(
            "background path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}
