//! Markdown to PDF conversion handler.
//!
//! `POST /md-to-pdf` with the raw Markdown as the body. The pipeline is a
//! straight fail-fast sequence:
//! 1. Reject anything but POST (405)
//! 2. Read the body up to the configured ceiling (400 on overflow)
//! 3. Stage `in*.md` / `out*.pdf` temporary files (500 on failure)
//! 4. Run the converter under its timeout (500 on failure or timeout)
//! 5. Return the PDF as `application/pdf`

use axum::{
    body::Body,
    extract::State,
    http::{Method, header},
    response::{IntoResponse, Response},
};

use crate::{error::AppError, services::staging::StagedFiles, state::AppState};

/// Convert an uploaded Markdown document into a PDF.
///
/// The staged files live in `staged` and are deleted when it goes out of
/// scope, whichever step returns.
pub async fn md_to_pdf(
    State(state): State<AppState>,
    method: Method,
    body: Body,
) -> Result<Response, AppError> {
    if method != Method::POST {
        return Err(AppError::MethodNotAllowed);
    }

    let markdown = axum::body::to_bytes(body, state.max_body_bytes)
        .await
        .map_err(|err| {
            tracing::debug!(error = %err, limit = state.max_body_bytes, "body rejected");
            AppError::BodyUnreadable
        })?;

    let staged = StagedFiles::create(&state.staging_dir)?;
    staged.write_input(&markdown).await?;

    state
        .converter
        .run(staged.input_path(), staged.output_path())
        .await?;

    let pdf = staged.read_output().await?;
    tracing::debug!(input = markdown.len(), output = pdf.len(), "converted document");

    Ok(([(header::CONTENT_TYPE, "application/pdf")], pdf).into_response())
}
