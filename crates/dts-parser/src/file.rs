use std::{
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{debug, info};

use crate::{
    clean::clean_line,
    node::merge_into,
    parser::{opens_node, parse_node_at, Depth, DEFAULT_MAX_DEPTH},
    value::parse_hex,
    IncludeError, LineSource, Node, ParseError, ParseErrorKind, SourceId, StructuralError,
    SyntaxError, Tree, Value, VersionError,
};

/// Options for parsing a file and the files it includes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Accept nodes before `/dts-v1/;`. Included files never require the tag.
    pub ignore_version_tag: bool,
    /// Directories searched in order for `/include/` files, before the directory of the
    /// including file and the working directory
    pub include_paths: Vec<PathBuf>,
    /// Bound for node nesting and include depth
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            ignore_version_tag: false,
            include_paths: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    #[must_use]
    pub fn with_include_paths(mut self, include_paths: Vec<PathBuf>) -> Self {
        self.include_paths = include_paths;
        self
    }
}

/// Name of the node synthesized for `/memreserve/ start end;`.
#[must_use]
pub fn reserved_memory_name(start: u64, end: u64) -> String {
    format!("reserved_memory_{start:#x}_{end:#x}")
}

fn parse_memreserve(args: &str) -> Result<Node, SyntaxError> {
    let malformed = || SyntaxError::MalformedDirective("/memreserve/");

    let args = args.trim().strip_suffix(';').ok_or_else(malformed)?;
    let mut parts = args.split_whitespace();
    let (Some(start), Some(end), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(malformed());
    };
    let start = parse_hex(start).ok_or_else(malformed)?;
    let end = parse_hex(end).ok_or_else(malformed)?;

    let name = reserved_memory_name(start, end);
    let mut node = Node {
        label: Some(name.clone()),
        address: Some(start),
        ..Node::new(name)
    };
    let reg = [start, end]
        .into_iter()
        .map(|n| i64::try_from(n).map(Value::Integer))
        .collect::<Result<_, _>>()
        .map_err(|_| malformed())?;
    node.properties.insert("reg".to_owned(), Value::CellArray(reg));
    Ok(node)
}

fn parse_include_name(args: &str) -> Result<&str, SyntaxError> {
    args.trim()
        .strip_prefix('"')
        .and_then(|name| name.strip_suffix('"'))
        .filter(|name| !name.is_empty())
        .ok_or(SyntaxError::MalformedDirective("/include/"))
}

struct FileParser<'o> {
    options: &'o ParseOptions,
    depth: Depth,
    check_version: bool,
    /// Directory of the file being parsed, searched after the include paths
    base_dir: Option<PathBuf>,
}

impl FileParser<'_> {
    fn run<R: BufRead>(&self, source: &mut LineSource<R>) -> Result<Tree, ParseError> {
        let mut tree = Tree::new();
        let mut has_version_tag = false;

        loop {
            let raw = source.read_line()?;
            if raw.is_empty() {
                break;
            }

            let line = clean_line(&raw, source)?;
            if line.is_empty() {
                continue;
            }

            if let Some(args) = line.strip_prefix("/include/") {
                let included = self.include(args).map_err(|err| match err {
                    IncludeFailure::Here(kind) => source.error(kind, &line),
                    IncludeFailure::Inside(err) => err,
                })?;
                for node in included.into_values() {
                    merge_into(&mut tree, node);
                }
            } else if line
                .strip_prefix("/dts-v1/")
                .is_some_and(|rest| rest.trim() == ";")
            {
                debug!(source = %source.id(), "Found version tag");
                has_version_tag = true;
            } else if let Some(args) = line.strip_prefix("/memreserve/") {
                let node = parse_memreserve(args).map_err(|err| source.error(err, &line))?;
                debug!(name = %node.name, "Reserved memory");
                merge_into(&mut tree, node);
            } else if opens_node(&line) {
                if self.check_version && !has_version_tag {
                    return Err(source.error(VersionError::MissingTag, &line));
                }
                let depth = self.depth.enter().map_err(|err| source.error(err, &line))?;
                let node = parse_node_at(&line, source, depth)?;
                merge_into(&mut tree, node);
            } else {
                return Err(source.error(SyntaxError::UnrecognizedLine, &line));
            }
        }

        Ok(tree)
    }

    /// Include paths, then the directory of the including file, then the working directory.
    fn search_path(&self) -> Vec<PathBuf> {
        self.options
            .include_paths
            .iter()
            .chain(self.base_dir.as_ref())
            .cloned()
            .chain(std::env::current_dir().ok())
            .collect()
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, IncludeError> {
        let search_path = self.search_path();
        search_path
            .iter()
            .map(|dir| dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| IncludeError::NotFound {
                name: name.to_owned(),
                search_path,
            })
    }

    fn include(&self, args: &str) -> Result<Tree, IncludeFailure> {
        let name = parse_include_name(args)?;
        let path = self.resolve(name)?;
        let depth = self.depth.enter()?;
        info!(path = %path.display(), "Including file");

        let parser = FileParser {
            options: self.options,
            depth,
            check_version: false,
            base_dir: path.parent().map(Path::to_path_buf),
        };
        parser.run_path(&path).map_err(IncludeFailure::Inside)
    }

    fn run_path(&self, path: &Path) -> Result<Tree, ParseError> {
        let source_id: SourceId = Arc::from(path.display().to_string());
        let file = fs_err::File::open(path)
            .map_err(|err| ParseError::new(source_id.clone(), 0, "", err))?;
        self.run(&mut LineSource::new(BufReader::new(file), source_id))
    }
}

/// Errors of an include directive, either at the directive itself or from inside the included
/// file.
enum IncludeFailure {
    Here(ParseErrorKind),
    Inside(ParseError),
}

macro_rules! include_failure_from {
    ($($error:ty),*) => {$(
        impl From<$error> for IncludeFailure {
            fn from(err: $error) -> Self {
                Self::Here(err.into())
            }
        }
    )*};
}

include_failure_from!(SyntaxError, IncludeError, StructuralError);

/// Parses a DTS stream into its top-level nodes.
///
/// Nodes defined more than once, directly or through `/include/`, are merged. Include paths
/// are searched in the order of [`ParseOptions::include_paths`].
///
/// # Errors
///
/// Any error aborts the whole parse. Errors inside included files are returned unchanged.
pub fn parse_file<R: BufRead>(
    reader: R,
    source_id: SourceId,
    options: &ParseOptions,
) -> Result<Tree, ParseError> {
    FileParser {
        options,
        depth: Depth::new(options.max_depth),
        check_version: !options.ignore_version_tag,
        base_dir: None,
    }
    .run(&mut LineSource::new(reader, source_id))
}

/// Parses DTS text held in memory.
///
/// # Errors
///
/// See [`parse_file`].
pub fn parse_str(text: &str, options: &ParseOptions) -> Result<Tree, ParseError> {
    parse_file(text.as_bytes(), Arc::from("<string>"), options)
}

/// Parses the DTS file at `path`. Its directory is searched for includes after the include
/// paths.
///
/// # Errors
///
/// See [`parse_file`].
pub fn parse_path(path: &Path, options: &ParseOptions) -> Result<Tree, ParseError> {
    FileParser {
        options,
        depth: Depth::new(options.max_depth),
        check_version: !options.ignore_version_tag,
        base_dir: path.parent().map(Path::to_path_buf),
    }
    .run_path(path)
}
