//! Line-level comparison of two texts

use std::fmt;

/// One line of a diff between an installed file and its remote version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    Common(String),
    /// Present only in the remote version
    Added(String),
    /// Present only in the installed version
    Removed(String),
}

impl fmt::Display for DiffLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffLine::Common(line) => write!(f, "  {}", line),
            DiffLine::Added(line) => write!(f, "+ {}", line),
            DiffLine::Removed(line) => write!(f, "- {}", line),
        }
    }
}

/// Largest LCS table (in cells) built for the differing middle section
const MAX_TABLE_CELLS: usize = 4 * 1024 * 1024;

/// Diff `old` against `new` line by line.
///
/// The common prefix and suffix are matched directly; the lines in between go
/// through a longest common subsequence. When that middle section is too
/// large for the table, it is reported as one removed block followed by one
/// added block.
pub fn diff_lines(old: &str, new: &str) -> Vec<DiffLine> {
    let old: Vec<&str> = old.split('\n').collect();
    let new: Vec<&str> = new.split('\n').collect();

    let prefix = old
        .iter()
        .zip(&new)
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let old_middle = &old[prefix..old.len() - suffix];
    let new_middle = &new[prefix..new.len() - suffix];

    let mut lines = Vec::with_capacity(old.len().max(new.len()));
    lines.extend(old[..prefix].iter().map(|l| DiffLine::Common(l.to_string())));

    let cells = (old_middle.len() + 1).saturating_mul(new_middle.len() + 1);
    if cells <= MAX_TABLE_CELLS {
        lcs_diff(old_middle, new_middle, &mut lines);
    } else {
        tracing::debug!(
            "Diff of {}x{} lines exceeds the table limit, reporting whole blocks",
            old_middle.len(),
            new_middle.len()
        );
        lines.extend(old_middle.iter().map(|l| DiffLine::Removed(l.to_string())));
        lines.extend(new_middle.iter().map(|l| DiffLine::Added(l.to_string())));
    }

    lines.extend(
        old[old.len() - suffix..]
            .iter()
            .map(|l| DiffLine::Common(l.to_string())),
    );
    lines
}

fn lcs_diff(old: &[&str], new: &[&str], lines: &mut Vec<DiffLine>) {
    // lcs[i][j] = length of the LCS of old[i..] and new[j..]
    let width = new.len() + 1;
    let mut lcs = vec![0u32; (old.len() + 1) * width];
    for i in (0..old.len()).rev() {
        for j in (0..new.len()).rev() {
            lcs[i * width + j] = if old[i] == new[j] {
                lcs[(i + 1) * width + j + 1] + 1
            } else {
                lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
            };
        }
    }

    let (mut i, mut j) = (0, 0);
    while i < old.len() && j < new.len() {
        if old[i] == new[j] {
            lines.push(DiffLine::Common(old[i].to_string()));
            i += 1;
            j += 1;
        } else if lcs[(i + 1) * width + j] >= lcs[i * width + j + 1] {
            lines.push(DiffLine::Removed(old[i].to_string()));
            i += 1;
        } else {
            lines.push(DiffLine::Added(new[j].to_string()));
            j += 1;
        }
    }
    lines.extend(old[i..].iter().map(|l| DiffLine::Removed(l.to_string())));
    lines.extend(new[j..].iter().map(|l| DiffLine::Added(l.to_string())));
}
