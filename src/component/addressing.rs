// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Helpers every component call runs through.
//!
//! None of these keep state, and none of them turn a failure into a
//! success: they only add context to errors.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::component::ComponentRef;
use crate::error::{DecodeError, Delivery, Error, TransportError, TransportErrorKind};

/// Parameter key carrying the instance id.
pub const ID_KEY: &str = "id";

/// Merges an instance id into call parameters.
///
/// - `id == None` (singleton): `params` is returned untouched.
/// - `params == None`: becomes `{"id": id}`.
/// - object `params`: `"id"` is set, replacing any value already there.
///
/// # Errors
///
/// Returns a `TransportError` with kind `InvalidRequest` when an id must be
/// merged into params that are not an object. Nothing is sent in that case.
pub fn inject_id(
    method: &str,
    id: Option<u32>,
    params: Option<Value>,
) -> Result<Option<Value>, TransportError> {
    let Some(id) = id else {
        return Ok(params);
    };

    match params {
        None | Some(Value::Null) => {
            let mut fields = Map::new();
            fields.insert(ID_KEY.to_string(), Value::from(id));
            Ok(Some(Value::Object(fields)))
        }
        Some(Value::Object(mut fields)) => {
            fields.insert(ID_KEY.to_string(), Value::from(id));
            Ok(Some(Value::Object(fields)))
        }
        Some(_) => Err(TransportError::new(
            method,
            TransportErrorKind::InvalidRequest,
            Delivery::NotSent,
            "params of an instance-addressed component must be an object",
        )),
    }
}

/// Decodes a raw result payload into `T`.
///
/// # Errors
///
/// Returns `DecodeError` naming `T` if the payload does not fit.
pub fn decode<T: DeserializeOwned>(payload: Value) -> Result<T, DecodeError> {
    serde_json::from_value(payload).map_err(DecodeError::new::<T>)
}

/// Decodes a raw result payload from bytes into `T`.
///
/// # Errors
///
/// Returns `DecodeError` naming `T` if the bytes are not valid JSON or the
/// JSON does not fit.
pub fn decode_slice<T: DeserializeOwned>(payload: &[u8]) -> Result<T, DecodeError> {
    serde_json::from_slice(payload).map_err(DecodeError::new::<T>)
}

/// Returns a closure that annotates an error with `component` and `action`.
///
/// Intended for `map_err`:
///
/// ```
/// use shelly_rpc::component::{annotate, ComponentRef, ComponentType};
/// use shelly_rpc::error::{ApplicationError, Error, ErrorKind};
///
/// let cover = ComponentRef::instance(ComponentType::Cover, 0);
/// let result: Result<(), Error> =
///     Err(ApplicationError::new("Cover.Open", -109, "calibrating").into());
///
/// let err = result.map_err(annotate(cover, "Open")).unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::Application);
/// assert_eq!(err.component(), Some(&cover));
/// ```
pub fn annotate<E: Into<Error>>(component: ComponentRef, action: &str) -> impl FnOnce(E) -> Error {
    move |err| Into::<Error>::into(err).annotate(component, action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentType;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn singleton_params_pass_through() {
        assert_eq!(inject_id("Sys.GetStatus", None, None).unwrap(), None);

        let params = json!({"config": {"device": {"name": "garage"}}});
        assert_eq!(
            inject_id("Sys.SetConfig", None, Some(params.clone())).unwrap(),
            Some(params)
        );
    }

    #[test]
    fn id_added_to_absent_params() {
        assert_eq!(
            inject_id("Cover.Open", Some(0), None).unwrap(),
            Some(json!({"id": 0}))
        );
    }

    #[test]
    fn id_merged_into_object_params() {
        let params = json!({"pos": 40});
        assert_eq!(
            inject_id("Cover.GoToPosition", Some(2), Some(params)).unwrap(),
            Some(json!({"id": 2, "pos": 40}))
        );
    }

    #[test]
    fn component_id_overrides_caller_id() {
        let params = json!({"id": 9, "on": true});
        assert_eq!(
            inject_id("Switch.Set", Some(1), Some(params)).unwrap(),
            Some(json!({"id": 1, "on": true}))
        );
    }

    #[test]
    fn scalar_params_are_rejected() {
        let err = inject_id("Switch.Set", Some(1), Some(json!(true))).unwrap_err();
        assert_eq!(err.kind(), TransportErrorKind::InvalidRequest);
        assert_eq!(err.method(), "Switch.Set");
        assert!(err.is_retry_safe());
    }

    #[test]
    fn decode_reports_target_type() {
        let err = decode::<Vec<u8>>(json!({"not": "a list"})).unwrap_err();
        assert!(err.target().contains("Vec<u8>"));
    }

    #[test]
    fn decode_slice_rejects_invalid_bytes() {
        let err = decode_slice::<Value>(b"{\"id\":0,").unwrap_err();
        assert!(err.json_error().is_eof());
        assert_eq!(Error::from(err).kind(), ErrorKind::Decode);
    }

    #[test]
    fn annotate_wraps_any_error_kind() {
        let cover = ComponentRef::instance(ComponentType::Cover, 1);
        let decode_err = decode::<u8>(json!("x")).unwrap_err();

        let err = annotate(cover, "GetStatus")(decode_err);
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(err.to_string().starts_with("cover:1 GetStatus: decode error: "));
    }
}
