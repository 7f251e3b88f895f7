//! Longest-common-subsequence list diff.
//!
//! [`calculate_diff`] aligns two ordered snapshots using an [`ItemCallback`]
//! and produces the row operations a list view needs to go from the old
//! snapshot to the new one:
//!
//! 1. rows of the old list with no counterpart are removed (from the end),
//! 2. rows are inserted or moved in new-list order,
//! 3. rows whose content changed are refreshed, with a payload when the
//!    callback can describe a partial update.
//!
//! Every position is relative to the list as patched by the operations that
//! precede it, so replaying the operations in order is always valid.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::callback::{ItemCallback, MediaItemCallback, UpdateKind};
use crate::error::Result;
use crate::record::{MediaItemRecord, validate_snapshot};

/// A single row-level edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RowOp<P> {
    /// `count` rows removed starting at `position`.
    Remove { position: usize, count: usize },
    /// `count` rows inserted at `position`. The inserted rows are
    /// `new[position..position + count]`.
    Insert { position: usize, count: usize },
    /// One row taken out at `from` and put back at `to`.
    Move { from: usize, to: usize },
    /// `count` rows starting at `position` (a position in the new list) must
    /// be refreshed. `payload == None` means a full rebind.
    Change {
        position: usize,
        count: usize,
        payload: Option<P>,
    },
}

/// Consumer of row operations, typically a list renderer.
pub trait ListUpdateCallback<P> {
    fn on_inserted(&mut self, position: usize, count: usize);
    fn on_removed(&mut self, position: usize, count: usize);
    fn on_moved(&mut self, from: usize, to: usize);
    fn on_changed(&mut self, position: usize, count: usize, payload: Option<&P>);
}

/// Result of [`calculate_diff`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult<P> {
    ops: Vec<RowOp<P>>,
    old_to_new: Vec<Option<usize>>,
    new_to_old: Vec<Option<usize>>,
}

impl<P> DiffResult<P> {
    pub fn ops(&self) -> &[RowOp<P>] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<RowOp<P>> {
        self.ops
    }

    /// True when the two snapshots render identically.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Position in the new list of the row found at `old_position` in the old
    /// list, `None` if that row was removed or the position is out of range.
    pub fn old_position_to_new(&self, old_position: usize) -> Option<usize> {
        self.old_to_new.get(old_position).copied().flatten()
    }

    /// Position in the old list of the row found at `new_position` in the new
    /// list, `None` if that row was inserted or the position is out of range.
    pub fn new_position_to_old(&self, new_position: usize) -> Option<usize> {
        self.new_to_old.get(new_position).copied().flatten()
    }

    /// Replays the operations, in order, into `target`.
    pub fn dispatch_updates_to<L: ListUpdateCallback<P>>(&self, target: &mut L) {
        for op in &self.ops {
            match op {
                RowOp::Remove { position, count } => target.on_removed(*position, *count),
                RowOp::Insert { position, count } => target.on_inserted(*position, *count),
                RowOp::Move { from, to } => target.on_moved(*from, *to),
                RowOp::Change {
                    position,
                    count,
                    payload,
                } => target.on_changed(*position, *count, payload.as_ref()),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Old(usize),
    New,
}

/// Computes the row operations turning `old` into `new`.
///
/// Precondition: identities are unique within each snapshot. Duplicates are
/// not repaired; use [`diff_snapshots`] to have them rejected.
///
/// With `detect_moves`, a row that left the common subsequence but still
/// exists in the new snapshot is reported as a [`RowOp::Move`] instead of a
/// removal followed by an insertion.
///
/// # Cost
///
/// Common leading and trailing rows are skipped first. The rows left in the
/// middle are aligned with an LCS table of `n × m` `u32` cells, and move
/// replay is quadratic in the number of rows. A 2 000 × 2 000 middle needs
/// about 16 MB: page larger catalogs before diffing them.
pub fn calculate_diff<T, C>(
    old: &[T],
    new: &[T],
    callback: &C,
    detect_moves: bool,
) -> DiffResult<C::Payload>
where
    C: ItemCallback<T>,
{
    let (mut old_to_new, mut new_to_old) = align(old, new, callback);

    if detect_moves {
        for (i, old_item) in old.iter().enumerate() {
            if old_to_new[i].is_some() {
                continue;
            }
            let target = (0..new.len())
                .find(|&j| new_to_old[j].is_none() && callback.same_identity(old_item, &new[j]));
            if let Some(j) = target {
                old_to_new[i] = Some(j);
                new_to_old[j] = Some(i);
            }
        }
    }

    let mut ops: Vec<RowOp<C::Payload>> = Vec::new();
    let mut current: Vec<Slot> = (0..old.len()).map(Slot::Old).collect();

    for i in (0..old.len()).rev() {
        if old_to_new[i].is_none() {
            current.remove(i);
            push_remove(&mut ops, i);
        }
    }

    for (j, source) in new_to_old.iter().enumerate() {
        match source {
            None => {
                current.insert(j, Slot::New);
                push_insert(&mut ops, j);
            }
            Some(i) => {
                // current[..j] est déjà dans l'ordre final
                let found = current[j..]
                    .iter()
                    .position(|slot| *slot == Slot::Old(*i))
                    .map(|offset| offset + j);
                if let Some(from) = found {
                    if from != j {
                        let slot = current.remove(from);
                        current.insert(j, slot);
                        ops.push(RowOp::Move { from, to: j });
                    }
                }
            }
        }
    }

    for (j, source) in new_to_old.iter().enumerate() {
        if let Some(i) = source {
            if !callback.same_content(&old[*i], &new[j]) {
                let payload = callback.change_payload(&old[*i], &new[j]);
                push_change(&mut ops, j, payload);
            }
        }
    }

    trace!(
        old_len = old.len(),
        new_len = new.len(),
        ops = ops.len(),
        "List diff computed"
    );

    DiffResult {
        ops,
        old_to_new,
        new_to_old,
    }
}

/// Diffs two media snapshots after checking that ids are unique in both.
pub fn diff_snapshots(
    old: &[MediaItemRecord],
    new: &[MediaItemRecord],
    detect_moves: bool,
) -> Result<DiffResult<UpdateKind>> {
    validate_snapshot(old)?;
    validate_snapshot(new)?;
    Ok(calculate_diff(old, new, &MediaItemCallback, detect_moves))
}

/// Pairs rows of the longest common subsequence under `same_identity`.
fn align<T, C>(old: &[T], new: &[T], callback: &C) -> (Vec<Option<usize>>, Vec<Option<usize>>)
where
    C: ItemCallback<T>,
{
    let mut old_to_new = vec![None; old.len()];
    let mut new_to_old = vec![None; new.len()];

    let mut prefix = 0;
    while prefix < old.len()
        && prefix < new.len()
        && callback.same_identity(&old[prefix], &new[prefix])
    {
        old_to_new[prefix] = Some(prefix);
        new_to_old[prefix] = Some(prefix);
        prefix += 1;
    }

    let mut suffix = 0;
    while suffix < old.len() - prefix
        && suffix < new.len() - prefix
        && callback.same_identity(&old[old.len() - 1 - suffix], &new[new.len() - 1 - suffix])
    {
        let i = old.len() - 1 - suffix;
        let j = new.len() - 1 - suffix;
        old_to_new[i] = Some(j);
        new_to_old[j] = Some(i);
        suffix += 1;
    }

    let old_mid = &old[prefix..old.len() - suffix];
    let new_mid = &new[prefix..new.len() - suffix];
    let rows = old_mid.len();
    let cols = new_mid.len();
    if rows == 0 || cols == 0 {
        return (old_to_new, new_to_old);
    }

    // lengths[i][j] = LCS de old_mid[i..] et new_mid[j..]
    let width = cols + 1;
    let mut lengths = vec![0u32; (rows + 1) * width];
    for i in (0..rows).rev() {
        for j in (0..cols).rev() {
            lengths[i * width + j] = if callback.same_identity(&old_mid[i], &new_mid[j]) {
                lengths[(i + 1) * width + j + 1] + 1
            } else {
                lengths[(i + 1) * width + j].max(lengths[i * width + j + 1])
            };
        }
    }

    let (mut i, mut j) = (0, 0);
    while i < rows && j < cols {
        if callback.same_identity(&old_mid[i], &new_mid[j])
            && lengths[i * width + j] == lengths[(i + 1) * width + j + 1] + 1
        {
            old_to_new[prefix + i] = Some(prefix + j);
            new_to_old[prefix + j] = Some(prefix + i);
            i += 1;
            j += 1;
        } else if lengths[(i + 1) * width + j] >= lengths[i * width + j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }

    (old_to_new, new_to_old)
}

fn push_remove<P>(ops: &mut Vec<RowOp<P>>, at: usize) {
    if let Some(RowOp::Remove { position, count }) = ops.last_mut() {
        if at + 1 == *position {
            *position = at;
            *count += 1;
            return;
        }
    }
    ops.push(RowOp::Remove {
        position: at,
        count: 1,
    });
}

fn push_insert<P>(ops: &mut Vec<RowOp<P>>, at: usize) {
    if let Some(RowOp::Insert { position, count }) = ops.last_mut() {
        if *position + *count == at {
            *count += 1;
            return;
        }
    }
    ops.push(RowOp::Insert {
        position: at,
        count: 1,
    });
}

fn push_change<P: PartialEq>(ops: &mut Vec<RowOp<P>>, at: usize, new_payload: Option<P>) {
    if let Some(RowOp::Change {
        position,
        count,
        payload,
    }) = ops.last_mut()
    {
        if *position + *count == at && *payload == new_payload {
            *count += 1;
            return;
        }
    }
    ops.push(RowOp::Change {
        position: at,
        count: 1,
        payload: new_payload,
    });
}
