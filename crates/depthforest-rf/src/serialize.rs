//! Plain-text tree files: one record per node, in pre-order.
//!
//! ```text
//! N <id> <u.dx> <u.dy> <v.dx> <v.dy> <threshold>
//! L <id> <p_0> ... <p_{label_num-1}>
//! ```
//!
//! Ids count up from 0 in writing order. Floats use the shortest
//! representation that parses back to the same value, so a reloaded tree
//! is bit-identical to the written one.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use depthforest_image::Offset;
use tracing::{debug, info, instrument};

use crate::error::RfError;
use crate::forest::RandomForest;
use crate::node::Node;
use crate::split::SplitCandidate;
use crate::tree::DecisionTree;

const SPLIT_TAG: &str = "N";
const LEAF_TAG: &str = "L";

/// Largest accepted distance between a leaf's probability sum and 1.
const DISTRIBUTION_TOLERANCE: f64 = 1e-9;

/// File name of tree `index` inside a forest directory.
#[must_use]
pub fn tree_file_name(index: usize) -> String {
    format!("{index}-Tree.txt")
}

enum Record {
    Split {
        id: usize,
        candidate: SplitCandidate,
    },
    Leaf {
        id: usize,
        distribution: Vec<f64>,
    },
}

impl Record {
    fn id(&self) -> usize {
        match self {
            Record::Split { id, .. } | Record::Leaf { id, .. } => *id,
        }
    }
}

/// A split record whose children are still being read.
struct BuildSite {
    depth: usize,
    candidate: SplitCandidate,
    left: Option<Node>,
}

fn parse_field<T: FromStr>(field: &str, what: &str) -> Result<T, String> {
    field
        .parse()
        .map_err(|_| format!("invalid {what} {field:?}"))
}

fn parse_float(field: &str, what: &str) -> Result<f64, String> {
    let value: f64 = parse_field(field, what)?;
    if !value.is_finite() {
        return Err(format!("non-finite {what} {field:?}"));
    }
    Ok(value)
}

fn parse_record(line: &str, label_num: usize) -> Result<Record, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let (tag, rest) = fields.split_first().ok_or("empty record")?;
    let expected = match *tag {
        SPLIT_TAG => 6,
        LEAF_TAG => 1 + label_num,
        other => return Err(format!("unknown record tag {other:?}")),
    };
    if rest.len() != expected {
        return Err(format!(
            "expected {expected} fields after {tag:?}, found {}",
            rest.len()
        ));
    }
    let id = parse_field(rest[0], "node id")?;

    if *tag == SPLIT_TAG {
        let v: Vec<f64> = rest[1..]
            .iter()
            .map(|f| parse_float(f, "split parameter"))
            .collect::<Result<_, _>>()?;
        let candidate = SplitCandidate::new(Offset::new(v[0], v[1]), Offset::new(v[2], v[3]), v[4]);
        Ok(Record::Split { id, candidate })
    } else {
        let distribution: Vec<f64> = rest[1..]
            .iter()
            .map(|f| parse_float(f, "probability"))
            .collect::<Result<_, _>>()?;
        if let Some(p) = distribution.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(format!("probability {p} outside [0, 1]"));
        }
        let total: f64 = distribution.iter().sum();
        if (total - 1.0).abs() > DISTRIBUTION_TOLERANCE {
            return Err(format!("probabilities sum to {total}, not 1"));
        }
        Ok(Record::Leaf { id, distribution })
    }
}

impl DecisionTree {
    /// Write this tree's records in pre-order.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error of `writer`.
    pub fn write_records(&self, writer: &mut impl Write) -> io::Result<()> {
        for (id, node) in self.root.preorder().enumerate() {
            match node {
                Node::Split { candidate, .. } => {
                    let SplitCandidate { u, v, threshold } = candidate;
                    writeln!(
                        writer,
                        "{SPLIT_TAG} {id} {} {} {} {} {threshold}",
                        u.dx, u.dy, v.dx, v.dy
                    )?;
                }
                Node::Leaf { distribution, .. } => {
                    write!(writer, "{LEAF_TAG} {id}")?;
                    for p in distribution {
                        write!(writer, " {p}")?;
                    }
                    writeln!(writer)?;
                }
            }
        }
        Ok(())
    }

    /// Rebuild a tree from the records in `text`.
    ///
    /// `source` names the origin of `text` in error messages. Blank lines are
    /// ignored. Nothing is returned unless the whole text is one complete tree.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::MalformedTree`] | bad tag, field count, number, or id; a leaf that is not a probability distribution; records after the root completes |
    /// | [`RfError::UnexpectedEndOfTree`] | the text ends inside a split |
    /// | [`RfError::EmptyTree`] | the text holds no record |
    pub fn parse_records(text: &str, label_num: usize, source: &Path) -> Result<Self, RfError> {
        let malformed = |line: usize, reason: String| RfError::MalformedTree {
            path: source.to_path_buf(),
            line,
            reason,
        };

        let mut stack: Vec<BuildSite> = Vec::new();
        let mut root: Option<Node> = None;
        let mut next_id = 0usize;

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            if line.trim().is_empty() {
                continue;
            }
            if root.is_some() {
                return Err(malformed(line_no, "record after the root node completed".into()));
            }
            let record = parse_record(line, label_num).map_err(|reason| malformed(line_no, reason))?;
            if record.id() != next_id {
                return Err(malformed(
                    line_no,
                    format!("expected node id {next_id}, found {}", record.id()),
                ));
            }
            next_id += 1;

            let depth = stack.len();
            let mut node = match record {
                Record::Split { candidate, .. } => {
                    stack.push(BuildSite {
                        depth,
                        candidate,
                        left: None,
                    });
                    continue;
                }
                Record::Leaf { distribution, .. } => Node::Leaf {
                    depth,
                    distribution,
                },
            };

            // Attach the finished node, closing every split it completes.
            loop {
                let Some(site) = stack.last_mut() else {
                    root = Some(node);
                    break;
                };
                let Some(left) = site.left.take() else {
                    site.left = Some(node);
                    break;
                };
                let (depth, candidate) = (site.depth, site.candidate);
                stack.pop();
                node = Node::Split {
                    depth,
                    candidate,
                    left: Box::new(left),
                    right: Box::new(node),
                };
            }
        }

        if !stack.is_empty() {
            return Err(RfError::UnexpectedEndOfTree {
                path: source.to_path_buf(),
                pending: stack.len(),
            });
        }
        let root = root.ok_or_else(|| RfError::EmptyTree {
            path: source.to_path_buf(),
        })?;
        Ok(Self::from_root(root, label_num))
    }

    /// Read a tree file.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::ReadTree`] when the file cannot be read, otherwise
    /// the errors of [`DecisionTree::parse_records`].
    pub fn read(path: &Path, label_num: usize) -> Result<Self, RfError> {
        let text = fs::read_to_string(path).map_err(|e| RfError::ReadTree {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse_records(&text, label_num, path)
    }

    /// Write this tree to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::WriteTree`] on any I/O failure.
    pub fn write(&self, path: &Path) -> Result<(), RfError> {
        let write_err = |e| RfError::WriteTree {
            path: path.to_path_buf(),
            source: e,
        };
        let mut writer = BufWriter::new(File::create(path).map_err(write_err)?);
        self.write_records(&mut writer).map_err(write_err)?;
        writer.flush().map_err(write_err)
    }
}

impl RandomForest {
    /// Write every tree to `dir/{i}-Tree.txt`, creating `dir` if needed.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::WriteTree`] when the directory or a file cannot be written.
    #[instrument(skip_all, fields(dir = %dir.as_ref().display(), n_trees = self.trees.len()))]
    pub fn write_forest(&self, dir: impl AsRef<Path>) -> Result<(), RfError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| RfError::WriteTree {
            path: dir.to_path_buf(),
            source: e,
        })?;
        for (index, tree) in self.trees.iter().enumerate() {
            let path = dir.join(tree_file_name(index));
            tree.write(&path)?;
            debug!(path = %path.display(), "tree written");
        }
        info!(n_trees = self.trees.len(), "forest saved");
        Ok(())
    }

    /// Load trees `0..tree_num` from `dir`.
    ///
    /// The forest exists only if every tree loads; the first failure is
    /// returned. A loaded forest carries no training parameters.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::InvalidTreeCount`] | `tree_num` is zero |
    /// | [`RfError::InvalidLabelCount`] | `label_num` is zero |
    /// | read and format variants | see [`DecisionTree::read`] |
    #[instrument(skip(dir), fields(dir = %dir.as_ref().display()))]
    pub fn load_forest(
        tree_num: usize,
        label_num: usize,
        dir: impl AsRef<Path>,
    ) -> Result<Self, RfError> {
        if tree_num == 0 {
            return Err(RfError::InvalidTreeCount { tree_num });
        }
        if label_num == 0 {
            return Err(RfError::InvalidLabelCount { label_num });
        }
        let dir: PathBuf = dir.as_ref().to_path_buf();
        let trees = (0..tree_num)
            .map(|index| DecisionTree::read(&dir.join(tree_file_name(index)), label_num))
            .collect::<Result<Vec<_>, _>>()?;
        info!(n_trees = trees.len(), "forest loaded");
        Ok(Self {
            trees,
            label_num,
            params: None,
        })
    }
}
