//! Line-based unified diff.
//!
//! Lines are matched with Myers' O(ND) shortest-edit-script algorithm, then
//! grouped into hunks with three lines of context. Output follows the
//! familiar unified format:
//!
//! ```text
//! --- version_1
//! +++ version_2
//! @@ -1,3 +1,3 @@
//!  unchanged
//! -old line
//! +new line
//! ```
//!
//! Emitted lines carry no trailing newline. Identical inputs produce an
//! empty diff.

/// Lines of unchanged context around each change.
pub const CONTEXT_LINES: usize = 3;

const FROM_LABEL: &str = "version_1";
const TO_LABEL: &str = "version_2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edit {
    Equal,
    Delete,
    Insert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Equal,
    Replace,
    Delete,
    Insert,
}

/// A contiguous run: `old[i1..i2]` corresponds to `new[j1..j2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Opcode {
    tag: Tag,
    i1: usize,
    i2: usize,
    j1: usize,
    j2: usize,
}

/// Unified diff of two texts, line by line.
#[must_use]
pub fn unified_diff(old: &str, new: &str) -> Vec<String> {
    let a: Vec<&str> = old.lines().collect();
    let b: Vec<&str> = new.lines().collect();

    let opcodes = opcodes(&shortest_edit(&a, &b));
    let groups = grouped(&opcodes, CONTEXT_LINES);

    let mut out = Vec::new();
    for group in groups {
        if out.is_empty() {
            out.push(format!("--- {FROM_LABEL}"));
            out.push(format!("+++ {TO_LABEL}"));
        }
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        out.push(format!(
            "@@ -{} +{} @@",
            format_range(first.i1, last.i2),
            format_range(first.j1, last.j2)
        ));
        for op in &group {
            match op.tag {
                Tag::Equal => {
                    out.extend(a[op.i1..op.i2].iter().map(|line| format!(" {line}")));
                }
                Tag::Replace | Tag::Delete | Tag::Insert => {
                    out.extend(a[op.i1..op.i2].iter().map(|line| format!("-{line}")));
                    out.extend(b[op.j1..op.j2].iter().map(|line| format!("+{line}")));
                }
            }
        }
    }
    out
}

/// `start,len` in 1-based unified-diff notation.
fn format_range(start: usize, stop: usize) -> String {
    let len = stop - start;
    match len {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{len}", start + 1),
    }
}

// ---------------------------------------------------------------------------
// Myers
// ---------------------------------------------------------------------------

#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn shortest_edit(a: &[&str], b: &[&str]) -> Vec<Edit> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max = n + m;
    if max == 0 {
        return Vec::new();
    }

    let offset = max;
    let idx = |k: isize| (k + offset) as usize;
    let mut v = vec![0_isize; (2 * max + 2) as usize];
    let mut trace: Vec<Vec<isize>> = Vec::new();

    'search: for d in 0..=max {
        trace.push(v.clone());
        let mut k = -d;
        while k <= d {
            let mut x = if k == -d || (k != d && v[idx(k - 1)] < v[idx(k + 1)]) {
                v[idx(k + 1)]
            } else {
                v[idx(k - 1)] + 1
            };
            let mut y = x - k;
            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            v[idx(k)] = x;
            if x >= n && y >= m {
                break 'search;
            }
            k += 2;
        }
    }

    let mut edits = Vec::new();
    let (mut x, mut y) = (n, m);
    for (d, v) in trace.iter().enumerate().rev() {
        let d = d as isize;
        let k = x - y;
        let prev_k = if k == -d || (k != d && v[idx(k - 1)] < v[idx(k + 1)]) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = v[idx(prev_k)];
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            edits.push(Edit::Equal);
            x -= 1;
            y -= 1;
        }
        if d > 0 {
            if x == prev_x {
                edits.push(Edit::Insert);
            } else {
                edits.push(Edit::Delete);
            }
            x = prev_x;
            y = prev_y;
        }
    }
    edits.reverse();
    edits
}

fn opcodes(edits: &[Edit]) -> Vec<Opcode> {
    let mut ops = Vec::new();
    let (mut i, mut j) = (0, 0);
    let mut pos = 0;
    while pos < edits.len() {
        let (i1, j1) = (i, j);
        if edits[pos] == Edit::Equal {
            while pos < edits.len() && edits[pos] == Edit::Equal {
                i += 1;
                j += 1;
                pos += 1;
            }
            ops.push(Opcode {
                tag: Tag::Equal,
                i1,
                i2: i,
                j1,
                j2: j,
            });
            continue;
        }

        while pos < edits.len() && edits[pos] != Edit::Equal {
            match edits[pos] {
                Edit::Delete => i += 1,
                Edit::Insert => j += 1,
                Edit::Equal => {}
            }
            pos += 1;
        }
        let tag = match (i > i1, j > j1) {
            (true, true) => Tag::Replace,
            (true, false) => Tag::Delete,
            _ => Tag::Insert,
        };
        ops.push(Opcode {
            tag,
            i1,
            i2: i,
            j1,
            j2: j,
        });
    }
    ops
}

/// Split opcodes into hunks, trimming equal runs to `context` lines.
fn grouped(ops: &[Opcode], context: usize) -> Vec<Vec<Opcode>> {
    if !ops.iter().any(|op| op.tag != Tag::Equal) {
        return Vec::new();
    }

    let mut codes = ops.to_vec();
    if let Some(first) = codes.first_mut() {
        if first.tag == Tag::Equal {
            first.i1 = first.i1.max(first.i2.saturating_sub(context));
            first.j1 = first.j1.max(first.j2.saturating_sub(context));
        }
    }
    if let Some(last) = codes.last_mut() {
        if last.tag == Tag::Equal {
            last.i2 = last.i2.min(last.i1 + context);
            last.j2 = last.j2.min(last.j1 + context);
        }
    }

    let mut groups = Vec::new();
    let mut group = Vec::new();
    for mut op in codes {
        if op.tag == Tag::Equal && op.i2 - op.i1 > 2 * context {
            group.push(Opcode {
                tag: Tag::Equal,
                i1: op.i1,
                i2: op.i2.min(op.i1 + context),
                j1: op.j1,
                j2: op.j2.min(op.j1 + context),
            });
            groups.push(std::mem::take(&mut group));
            op.i1 = op.i1.max(op.i2.saturating_sub(context));
            op.j1 = op.j1.max(op.j2.saturating_sub(context));
        }
        group.push(op);
    }
    if !(group.is_empty() || group.len() == 1 && group[0].tag == Tag::Equal) {
        groups.push(group);
    }
    groups.retain(|g| g.iter().any(|op| op.tag != Tag::Equal));
    groups
}
