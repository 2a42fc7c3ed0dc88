//! Call control operations
//!
//! Thin request wrappers over the correlator, keyed by call id and scoped by
//! the call's application id. Two operations are gated locally before any
//! frame is sent: `hold_call` and `unhold_call` reject with
//! [`ClientError::InvalidCallState`] when the call's own predicates say the
//! toggle is illegal. `hangup_call` infers a cause locally when none is
//! given. Everything else is decided by the server.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::call::{causes, Call, CallDirection};
use crate::error::{ClientError, ClientResult};
use crate::phone::{AnswerOptions, PlaceCallRequest};
use crate::transport::actions;

/// Cause selected when the caller hangs up without naming one: an
/// unanswered inbound leg reports busy, an unanswered outbound leg reports
/// that the originator cancelled, anything answered clears normally.
fn infer_hangup_cause(call: &Call) -> &'static str {
    if call.answered_at() != 0 {
        causes::NORMAL_CLEARING
    } else {
        match call.direction() {
            CallDirection::Inbound => causes::USER_BUSY,
            CallDirection::Outbound => causes::ORIGINATOR_CANCEL,
        }
    }
}

fn is_dtmf_digit(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '*' | '#' | 'A'..='D' | 'a'..='d')
}

impl super::manager::ClientManager {
    fn require_call(&self, call_id: &str) -> ClientResult<Arc<Call>> {
        self.registry.get(call_id).ok_or_else(|| ClientError::CallNotFound {
            call_id: call_id.to_owned(),
        })
    }

    fn control_payload(call: &Call) -> Value {
        json!({
            "id": call.id(),
            "applicationId": call.application_id(),
        })
    }

    /// Answer a ringing call: accept on the signaling plane, then hand the
    /// media leg to the phone collaborator.
    pub async fn answer_call(&self, call_id: &str) -> ClientResult<()> {
        self.answer_call_with(call_id, AnswerOptions::default()).await
    }

    /// Answer with explicit options; auto-answer policy passes
    /// `auto_answered: true` so the phone stack can skip alerting.
    pub async fn answer_call_with(
        &self,
        call_id: &str,
        options: AnswerOptions,
    ) -> ClientResult<()> {
        let call = self.require_call(call_id)?;
        self.issue_request(actions::ANSWER, Self::control_payload(&call))
            .await?;
        if let Some(phone) = &self.phone {
            phone.answer(call_id, options).await?;
        }
        Ok(())
    }

    /// Hang a call up. Without an explicit cause one is inferred locally
    /// from direction and whether the call was ever answered.
    pub async fn hangup_call(&self, call_id: &str, cause: Option<&str>) -> ClientResult<()> {
        let call = self.require_call(call_id)?;
        let cause = cause.unwrap_or_else(|| infer_hangup_cause(&call));
        let mut payload = Self::control_payload(&call);
        payload["cause"] = json!(cause);
        self.issue_request(actions::HANGUP, payload).await?;
        Ok(())
    }

    /// Park the call on hold. Rejects locally, without a round trip, unless
    /// the call is active or bridged and not hung up.
    pub async fn hold_call(&self, call_id: &str) -> ClientResult<()> {
        let call = self.require_call(call_id)?;
        if !call.can_hold() {
            return Err(ClientError::InvalidCallState {
                call_id: call_id.to_owned(),
                current_state: call.state(),
            });
        }
        self.issue_request(actions::HOLD, Self::control_payload(&call))
            .await?;
        Ok(())
    }

    /// Retrieve a held call. Rejects locally unless the call is on hold.
    pub async fn unhold_call(&self, call_id: &str) -> ClientResult<()> {
        let call = self.require_call(call_id)?;
        if !call.can_unhold() {
            return Err(ClientError::InvalidCallState {
                call_id: call_id.to_owned(),
                current_state: call.state(),
            });
        }
        self.issue_request(actions::UNHOLD, Self::control_payload(&call))
            .await?;
        Ok(())
    }

    /// Send DTMF digits on an answered call
    pub async fn send_dtmf(&self, call_id: &str, digits: &str) -> ClientResult<()> {
        let call = self.require_call(call_id)?;
        if digits.is_empty() || !digits.chars().all(is_dtmf_digit) {
            return Err(ClientError::InvalidConfiguration {
                field: "digits".into(),
                reason: format!("not a DTMF digit string: {digits:?}"),
            });
        }
        if !call.can_send_dtmf() {
            return Err(ClientError::InvalidCallState {
                call_id: call_id.to_owned(),
                current_state: call.state(),
            });
        }
        let mut payload = Self::control_payload(&call);
        payload["digits"] = json!(digits);
        self.issue_request(actions::DTMF, payload).await?;
        Ok(())
    }

    /// Blind-transfer the call to another destination
    pub async fn blind_transfer(&self, call_id: &str, destination: &str) -> ClientResult<()> {
        let call = self.require_call(call_id)?;
        let mut payload = Self::control_payload(&call);
        payload["destination"] = json!(destination);
        self.issue_request(actions::TRANSFER, payload).await?;
        Ok(())
    }

    /// Mute or unmute the captured audio. The flag on the entity flips once
    /// the server acknowledges.
    pub async fn set_mute(&self, call_id: &str, muted: bool) -> ClientResult<()> {
        let call = self.require_call(call_id)?;
        let mut payload = Self::control_payload(&call);
        payload["muted"] = json!(muted);
        self.issue_request(actions::MUTE, payload).await?;
        call.set_muted(muted);
        Ok(())
    }

    /// Bridge this call to another live leg
    pub async fn bridge_call(&self, call_id: &str, target_call_id: &str) -> ClientResult<()> {
        let call = self.require_call(call_id)?;
        let target = self.require_call(target_call_id)?;
        let mut payload = Self::control_payload(&call);
        payload["bridgedId"] = json!(target.id());
        self.issue_request(actions::BRIDGE, payload).await?;
        Ok(())
    }

    /// Listen in on a call (supervisor feature); audibility is the
    /// server's decision
    pub async fn eavesdrop_call(&self, call_id: &str) -> ClientResult<()> {
        let call = self.require_call(call_id)?;
        self.issue_request(actions::EAVESDROP, Self::control_payload(&call))
            .await?;
        Ok(())
    }

    /// Route the call directly to a named user
    pub async fn route_to_user(&self, call_id: &str, user_id: &str) -> ClientResult<()> {
        let call = self.require_call(call_id)?;
        let mut payload = Self::control_payload(&call);
        payload["userId"] = json!(user_id);
        self.issue_request(actions::ROUTE_TO_USER, payload).await?;
        Ok(())
    }

    /// Originate an outbound call through the phone collaborator. The call
    /// entity appears once the server reports the new leg ringing.
    pub async fn place_call(&self, request: PlaceCallRequest) -> ClientResult<()> {
        let Some(phone) = &self.phone else {
            return Err(ClientError::phone_error(
                "no phone collaborator configured",
            ));
        };
        phone.place_call(request).await
    }
}
