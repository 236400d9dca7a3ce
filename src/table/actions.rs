//! Bulk actions and dataset export.

use std::path::Path;
use std::path::PathBuf;

use chrono::DateTime;
use chrono::Utc;
use log::info;
use log::warn;
use serde_json::json;

use crate::error::ApiError;
use crate::error::Error;
use crate::error::Result;
use crate::error::ValidationErrors;
use crate::query;
use crate::table::controller::ControllerInner;
use crate::table::row::TableRow;
use crate::table::state::Mode;
use crate::table::state::RowStore;
use crate::transport::ApiRequest;

/// Options for [`TableController::export`](crate::TableController::export).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Export every matching record rather than the current page.
    pub export_all: bool,
    /// Restrict exported fields to the visible columns.
    pub visible_only: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            export_all: true,
            visible_only: false,
        }
    }
}

impl ExportOptions {
    /// Sets whether every matching record is exported.
    pub fn export_all(mut self, yes: bool) -> Self {
        self.export_all = yes;
        self
    }

    /// Sets whether exported fields are restricted to visible columns.
    pub fn visible_only(mut self, yes: bool) -> Self {
        self.visible_only = yes;
        self
    }
}

/// Result of a completed export.
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// Destination file.
    pub path: PathBuf,
    /// Bytes written to the destination.
    pub bytes_written: u64,
    /// Number of exported rows, when the export ran against resident data.
    pub rows: Option<usize>,
    /// Completion time.
    pub completed_at: DateTime<Utc>,
}

impl<T: TableRow> ControllerInner<T> {
    pub(crate) async fn bulk_action(&self, action: &str) -> Result<()> {
        if !self.config.bulk_actions.iter().any(|a| a == action) {
            return Err(Error::invalid_operation(format!(
                "bulk action `{action}` is not configured"
            )));
        }
        let ids = {
            let state = self.state.lock().await;
            state.selected.clone()
        };
        if ids.is_empty() {
            return Err(Error::invalid_operation("no rows are selected"));
        }

        let request = ApiRequest::post(
            format!("{}/bulk", self.endpoint),
            json!({ "action": action, "ids": ids }),
        )
        .with_timeout(self.config.request_timeout);

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(error) => {
                self.state.lock().await.error = Some(error.user_message());
                return Err(error.into());
            }
        };

        if response.status == 422 {
            if let Some(errors) = ValidationErrors::from_body(&response.body) {
                warn!("bulk action `{action}` rejected: {errors}");
                self.state.lock().await.error = Some(errors.to_string());
                return Err(Error::Validation(errors));
            }
        }
        if !response.is_success() {
            let error = ApiError::http(response.status, response.body);
            self.state.lock().await.error = Some(error.user_message());
            return Err(error.into());
        }

        info!("bulk action `{action}` applied to {} rows", ids.len());
        self.state.lock().await.selected.clear();
        self.refresh_dataset().await;
        Ok(())
    }

    pub(crate) async fn export(&self, options: ExportOptions, dest: &Path) -> Result<ExportReport> {
        let full_client = {
            let state = self.state.lock().await;
            state.phase.mode() == Some(Mode::FullClient)
        };
        if full_client {
            self.export_resident(options, dest).await
        } else {
            self.export_remote(options, dest).await
        }
    }

    /// Writes the resident dataset as a JSON array, optionally projected to
    /// the visible columns and clipped to the current page.
    async fn export_resident(&self, options: ExportOptions, dest: &Path) -> Result<ExportReport> {
        let (rows, visible) = {
            let state = self.state.lock().await;
            let rows = match &state.rows {
                RowStore::Full(rows) => {
                    if options.export_all {
                        rows.clone()
                    } else {
                        let start = (state.current_page as usize - 1) * state.per_page as usize;
                        let end = (start + state.per_page as usize).min(rows.len());
                        rows.get(start..end).unwrap_or(&[]).to_vec()
                    }
                }
                _ => Vec::new(),
            };
            (rows, state.visible_columns())
        };

        let mut values = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut value = serde_json::to_value(row)?;
            if options.visible_only {
                if let serde_json::Value::Object(map) = &mut value {
                    map.retain(|key, _| visible.iter().any(|field| field == key));
                }
            }
            values.push(value);
        }
        let body = serde_json::to_vec_pretty(&values)?;
        tokio::fs::write(dest, &body).await?;

        info!("exported {} resident rows to {}", values.len(), dest.display());
        Ok(ExportReport {
            path: dest.to_path_buf(),
            bytes_written: body.len() as u64,
            rows: Some(values.len()),
            completed_at: Utc::now(),
        })
    }

    /// Streams a server-built export for the current filters to `dest`.
    async fn export_remote(&self, options: ExportOptions, dest: &Path) -> Result<ExportReport> {
        let params = {
            let state = self.state.lock().await;
            let mut params = query::translate(&state.filters, &state.sorts);
            for (key, value) in &self.config.initial_params {
                params.push(key.clone(), value.clone());
            }
            params.push("export_all", options.export_all.to_string());
            params.push("visible_only", options.visible_only.to_string());
            params
        };
        let request = ApiRequest::get(format!("{}/export", self.endpoint))
            .with_params(params)
            .with_timeout(self.config.request_timeout);

        match self.transport.download(request, dest).await {
            Ok(bytes_written) => {
                info!("exported to {} ({bytes_written} bytes)", dest.display());
                Ok(ExportReport {
                    path: dest.to_path_buf(),
                    bytes_written,
                    rows: None,
                    completed_at: Utc::now(),
                })
            }
            Err(error) => {
                warn!("export failed: {error}");
                self.state.lock().await.error =
                    Some("The export failed. Please try again.".to_string());
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_options_defaults() {
        let options = ExportOptions::default();
        assert!(options.export_all);
        assert!(!options.visible_only);
    }

    #[test]
    fn test_export_options_fluent() {
        let options = ExportOptions::default().export_all(false).visible_only(true);
        assert!(!options.export_all);
        assert!(options.visible_only);
    }
}
