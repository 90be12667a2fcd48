// storefront/src/web/handlers/gate_handlers.rs

//! The lead-capture gate. The visitor's flag and cached profile live in
//! their cookies, so every response carries the cookie writes, including
//! error responses after the flag was already set.

use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use karat::flows::LeadSubmission;
use karat::{LeadForm, LeadGate, Shared};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::ensure_completed;
use crate::services::VisitorCookies;
use crate::state::AppState;

#[derive(Deserialize, Debug, Default)]
pub struct GateParams {
  /// The page the visitor is on; admin pages never show the gate.
  pub path: Option<String>,
}

fn visitor_gate(req: &HttpRequest) -> (Arc<VisitorCookies>, LeadGate) {
  let cookies = Arc::new(VisitorCookies::from_request(req));
  let gate = LeadGate::new(cookies.clone());
  (cookies, gate)
}

fn respond(cookies: &VisitorCookies, result: AppResult<HttpResponse>) -> HttpResponse {
  let mut response = result.unwrap_or_else(|e| e.error_response());
  cookies.apply(&mut response);
  response
}

#[instrument(name = "handler::gate_state", skip(req, params))]
pub async fn gate_state_handler(req: HttpRequest, params: web::Query<GateParams>) -> AppResult<HttpResponse> {
  let (_, gate) = visitor_gate(&req);
  let path = params.into_inner().path.unwrap_or_else(|| "/".to_string());
  Ok(HttpResponse::Ok().json(json!({
    "state": gate.state()?,
    "show": gate.should_show(&path)?,
    "profile": gate.cached_profile()?,
  })))
}

async fn run_submission(app_state: &AppState, ctx: Shared<LeadSubmission>) -> AppResult<()> {
  let outcome = app_state.workflows.run(ctx).await?;
  ensure_completed(outcome)
}

#[instrument(name = "handler::gate_submit", skip(req, app_state, form))]
pub async fn submit_lead_handler(
  req: HttpRequest,
  app_state: web::Data<AppState>,
  form: web::Json<LeadForm>,
) -> HttpResponse {
  let (cookies, gate) = visitor_gate(&req);
  let ctx = Shared::new(LeadSubmission::submit(app_state.store.clone(), gate.clone(), form.into_inner()));

  let result = async {
    run_submission(&app_state, ctx.clone()).await?;
    let lead = ctx
      .read()
      .recorded
      .clone()
      .ok_or_else(|| AppError::Internal("lead submission finished without a record".to_string()))?;
    info!(lead_id = %lead.id, "Lead captured.");
    Ok::<_, AppError>(HttpResponse::Created().json(json!({ "state": gate.state()?, "lead": lead })))
  }
  .await;
  respond(&cookies, result)
}

#[instrument(name = "handler::gate_skip", skip(req, app_state))]
pub async fn skip_gate_handler(req: HttpRequest, app_state: web::Data<AppState>) -> HttpResponse {
  let (cookies, gate) = visitor_gate(&req);
  let ctx = Shared::new(LeadSubmission::skip(app_state.store.clone(), gate.clone()));

  let result = async {
    run_submission(&app_state, ctx).await?;
    Ok::<_, AppError>(HttpResponse::Ok().json(json!({ "state": gate.state()? })))
  }
  .await;
  respond(&cookies, result)
}
