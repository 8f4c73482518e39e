//! Commit and revert.
//!
//! Both operations check every precondition before touching anything, so a
//! failed call leaves the head, the history and the working copy content as
//! they were.

use chrono::Utc;
use draftline_types::{NewVersion, Version, VersionId};
use draftline_workspace::WorkingCopy;
use tracing::{info, warn};

use crate::commit::CommitRequest;
use crate::document::Document;
use crate::error::{CoreError, CoreResult};

/// Commit the document's own working copy.
///
/// Fails with [`CoreError::NothingToCommit`] when no working copy is open
/// or it has no net changes.
pub fn commit<'a>(document: &'a mut Document, request: CommitRequest) -> CoreResult<&'a Version> {
    let Some(mut wc) = document.working_copy.take() else {
        warn!(document = %document.id, "commit rejected: no working copy");
        return Err(CoreError::NothingToCommit);
    };
    let outcome = seal_and_append(document, &mut wc, request);
    document.working_copy = Some(wc);
    outcome?;
    Ok(document.head())
}

/// Commit a working copy held outside the document, such as one loaded
/// by another session.
///
/// The working copy's base must still be the document's head; otherwise
/// the commit fails with [`CoreError::StaleWorkingCopy`] and the caller
/// must reload and reapply its edits. On success `wc` is rebased onto the
/// new version in place.
pub fn commit_working_copy<'a>(
    document: &'a mut Document,
    wc: &mut WorkingCopy,
    request: CommitRequest,
) -> CoreResult<&'a Version> {
    seal_and_append(document, wc, request)?;
    Ok(document.head())
}

fn seal_and_append(
    document: &mut Document,
    wc: &mut WorkingCopy,
    request: CommitRequest,
) -> CoreResult<()> {
    if wc.document_id() != &document.id {
        return Err(CoreError::ForeignWorkingCopy {
            expected: document.id.clone(),
            actual: wc.document_id().clone(),
        });
    }
    let head = document.history.head();
    if wc.base_version_id() != &head.id {
        warn!(
            document = %document.id,
            base = %wc.base_number(),
            head = %head.number,
            "commit rejected: stale working copy"
        );
        return Err(CoreError::StaleWorkingCopy {
            base: wc.base_version_id().clone(),
            head: head.id.clone(),
        });
    }
    if !wc.is_dirty() {
        warn!(document = %document.id, "commit rejected: nothing to commit");
        return Err(CoreError::NothingToCommit);
    }
    let number = document.history.next_number(request.bump)?;

    wc.begin_commit();
    let sealed = NewVersion {
        document_id: document.id.clone(),
        number,
        parent_id: Some(head.id.clone()),
        message: request.message,
        author: request.author,
        timestamp: Utc::now(),
        sections: wc.sections().clone(),
        changes: wc.pending_changes().to_vec(),
    }
    .seal();
    let version = match sealed {
        Ok(version) => version,
        Err(e) => {
            wc.abort_commit();
            return Err(e.into());
        }
    };

    let appended = match document.history.append(version) {
        Ok(appended) => appended,
        Err(e) => {
            wc.abort_commit();
            return Err(e.into());
        }
    };
    info!(
        document = %document.id,
        version = %appended.number,
        changes = appended.changes.len(),
        author = %appended.author,
        "committed version"
    );
    wc.rebase(appended);
    Ok(())
}

/// Replace the working copy with a clean one forked from `target`.
///
/// Uncommitted edits are dropped. The head moves to `target`, so the next
/// commit's parent is `target`; versions after it stay in the history.
pub fn revert<'a>(document: &'a mut Document, target: &VersionId) -> CoreResult<&'a mut WorkingCopy> {
    let version = document
        .history
        .get(target)
        .ok_or_else(|| CoreError::VersionNotFound(target.clone()))?;
    let fresh = WorkingCopy::fork(version);
    let dropped = document
        .working_copy
        .as_ref()
        .map_or(0, |wc| wc.pending_changes().len());
    document.history.move_head(target)?;
    info!(
        document = %document.id,
        version = %document.history.head().number,
        dropped,
        "reverted"
    );
    Ok(document.working_copy.insert(fresh))
}
