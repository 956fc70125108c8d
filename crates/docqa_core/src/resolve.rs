//! crates/docqa_core/src/resolve.rs
//!
//! Decides which document a question is directed at.

use tracing::debug;

use crate::domain::{Document, DocumentId, SessionContext};
use crate::error::{QaError, QaResult};
use crate::ports::{DocumentStore, SessionStore};

/// Resolves the target document for a question.
///
/// An `explicit` id must name a document owned by the requesting user. Without one,
/// the session's active document is used if it still exists for this user, then the
/// user's most recent upload. Whatever is resolved becomes the session's active
/// document, both in `ctx` and in the session store.
pub async fn resolve_document<S>(
    store: &S,
    ctx: &mut SessionContext,
    explicit: Option<DocumentId>,
) -> QaResult<Document>
where
    S: DocumentStore + SessionStore + ?Sized,
{
    let document = match explicit {
        Some(id) => store
            .get_by_id_for_owner(id, ctx.user_id)
            .await?
            .ok_or(QaError::DocumentNotFound)?,
        None => resolve_implicit(store, ctx).await?,
    };

    remember_active(store, ctx, document.id).await?;
    Ok(document)
}

async fn resolve_implicit<S>(store: &S, ctx: &SessionContext) -> QaResult<Document>
where
    S: DocumentStore + ?Sized,
{
    if let Some(active) = ctx.active_document_id {
        if let Some(doc) = store.get_by_id_for_owner(active, ctx.user_id).await? {
            return Ok(doc);
        }
        debug!(document_id = active, "Active document is gone; falling back to most recent upload.");
    }

    store
        .get_most_recent_by_owner(ctx.user_id)
        .await?
        .ok_or(QaError::NoDocument)
}

/// Points the session at `document_id`, skipping the write when nothing changes.
pub async fn remember_active<S>(
    store: &S,
    ctx: &mut SessionContext,
    document_id: DocumentId,
) -> QaResult<()>
where
    S: SessionStore + ?Sized,
{
    if ctx.active_document_id != Some(document_id) {
        store
            .set_active_document(&ctx.session_id, document_id)
            .await?;
        ctx.active_document_id = Some(document_id);
    }
    Ok(())
}
