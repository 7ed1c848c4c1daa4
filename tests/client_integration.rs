// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end client behavior against the in-process mock transport.

use std::time::Duration;

use serde_json::json;
use shelly_rpc::component::{ComponentRef, ComponentType, Extensible, ID_KEY};
use shelly_rpc::error::{ApplicationError, Delivery, ErrorKind, TransportErrorKind};
use shelly_rpc::protocol::{MockTransport, Reply, Response};
use shelly_rpc::response::{CoverState, CoverStatus};
use shelly_rpc::{Client, Context, Device};

// ============================================================================
// Accessor Calls
// ============================================================================

mod accessors {
    use super::*;

    #[tokio::test]
    async fn cover_open_succeeds() {
        let mock = MockTransport::new().with("Cover.Open", Reply::result(json!({"was_on": false})));
        let device = Device::new(mock.clone());

        device.cover(0).open(&Context::background()).await.unwrap();

        let calls = mock.calls_to("Cover.Open");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].params, Some(json!({"id": 0})));
    }

    #[tokio::test]
    async fn cover_status_decodes() {
        let mock = MockTransport::new().with(
            "Cover.GetStatus",
            Reply::result(json!({"id": 0, "state": "open", "current_pos": 100})),
        );
        let device = Device::new(mock);

        let status = device
            .cover(0)
            .get_status(&Context::background())
            .await
            .unwrap();
        assert_eq!(status.state, Some(CoverState::Open));
        assert_eq!(status.current_pos, Some(100));
        assert!(status.unknown.is_empty());
    }

    #[tokio::test]
    async fn instance_params_carry_id() {
        let mock = MockTransport::new().with("Switch.Set", Reply::result(json!({"was_on": false})));
        let device = Device::new(mock.clone());

        device
            .switch(3)
            .set(&Context::background(), true)
            .await
            .unwrap();

        let params = mock.calls()[0].params.clone().unwrap();
        assert_eq!(params[ID_KEY], json!(3));
        assert_eq!(params["on"], json!(true));
    }

    #[tokio::test]
    async fn singleton_params_carry_no_id() {
        let mock = MockTransport::new()
            .with("Sys.GetStatus", Reply::result(json!({"uptime": 1})))
            .with("Sys.GetConfig", Reply::result(json!({})))
            .with("WiFi.GetStatus", Reply::result(json!({})))
            .with("WiFi.GetConfig", Reply::result(json!({})));
        let device = Device::new(mock.clone());
        let cx = Context::background();

        device.sys().get_status(&cx).await.unwrap();
        device.sys().get_config(&cx).await.unwrap();
        device.wifi().get_status(&cx).await.unwrap();
        device.wifi().get_config(&cx).await.unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 4);
        for call in calls {
            let has_id = call
                .params
                .as_ref()
                .is_some_and(|p| p.get(ID_KEY).is_some());
            assert!(!has_id, "{} carried an id", call.method);
        }
    }

    #[tokio::test]
    async fn unknown_members_survive_round_trip() {
        let payload = json!({
            "id": 0,
            "source": "init",
            "state": "stopped",
            "current_pos": 42,
            "pos_control": true,
            "slat_pos": 20,
            "future_member": {"nested": [1, 2, 3]}
        });
        let mock =
            MockTransport::new().with("Cover.GetStatus", Reply::result(payload.clone()));
        let device = Device::new(mock);

        let status: Extensible<CoverStatus> = device
            .cover(0)
            .get_status(&Context::background())
            .await
            .unwrap();

        assert_eq!(status.unknown.len(), 2);
        assert!(status.unknown.contains_key("slat_pos"));
        assert!(status.unknown.contains_key("future_member"));
        assert_eq!(serde_json::to_value(&status).unwrap(), payload);
    }
}

// ============================================================================
// Error Classification
// ============================================================================

mod errors {
    use super::*;

    #[tokio::test]
    async fn transport_failure_reaches_every_method() {
        let mock = MockTransport::new();
        mock.fallback(Reply::failure(
            TransportErrorKind::ConnectionLost,
            Delivery::Unknown,
        ));
        let device = Device::new(mock);
        let cx = Context::background();

        let errors = [
            device.cover(0).open(&cx).await.unwrap_err(),
            device.cover(0).get_status(&cx).await.unwrap_err(),
            device.switch(1).toggle(&cx).await.unwrap_err(),
            device.sys().get_config(&cx).await.unwrap_err(),
            device.get_status(&cx).await.unwrap_err(),
        ];
        for err in &errors {
            assert_eq!(err.kind(), ErrorKind::Transport, "{err}");
            let transport = err.as_transport().unwrap();
            assert_eq!(transport.kind(), TransportErrorKind::ConnectionLost);
            assert_eq!(transport.delivery(), Delivery::Unknown);
            assert!(!err.is_retry_safe());
        }
    }

    #[tokio::test]
    async fn device_error_is_passed_through() {
        let mock = MockTransport::new().with(
            "Cover.Open",
            Reply::device_error(ApplicationError::FAILED_PRECONDITION, "Cover is calibrating"),
        );
        let device = Device::new(mock);

        let err = device
            .cover(0)
            .open(&Context::background())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Application);
        assert_eq!(
            err.component(),
            Some(&ComponentRef::instance(ComponentType::Cover, 0))
        );

        let app = err.as_application().unwrap();
        assert_eq!(app.code, -109);
        assert_eq!(app.message, "Cover is calibrating");
        assert_eq!(app.method, "Cover.Open");
    }

    #[tokio::test]
    async fn ambiguous_envelope_is_transport_error() {
        let mut envelope = Response::success(json!({}));
        envelope.error = Response::failure(-103, "bad").error;
        let mock = MockTransport::new().with("Sys.GetStatus", Reply::Envelope(envelope));
        let client = Client::new(mock);

        let err = client
            .call(&Context::background(), "Sys.GetStatus", None)
            .await
            .unwrap_err();
        assert_eq!(
            err.as_transport().map(|e| e.kind()),
            Some(TransportErrorKind::InvalidEnvelope)
        );
    }

    #[tokio::test]
    async fn missing_result_decodes_as_null() {
        let mock = MockTransport::new().with("Cover.Stop", Reply::Envelope(Response::default()));
        let device = Device::new(mock);

        device.cover(0).stop(&Context::background()).await.unwrap();
    }

    #[tokio::test]
    async fn unexpected_shape_is_decode_error() {
        let mock =
            MockTransport::new().with("Cover.GetStatus", Reply::result(json!([0, "open"])));
        let device = Device::new(mock);

        let err = device
            .cover(0)
            .get_status(&Context::background())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(err.as_decode().unwrap().target().contains("CoverStatus"));
        assert!(err.to_string().starts_with("cover:0 GetStatus: decode error"));
    }
}

// ============================================================================
// Cancellation and Concurrency
// ============================================================================

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn cancel_before_response_abandons_call() {
        let mock = MockTransport::new().with("Cover.Close", Reply::Deferred);
        let device = Device::new(mock.clone());
        let cx = Context::background();

        let task = {
            let cover = device.cover(0);
            let cx = cx.clone();
            tokio::spawn(async move { cover.close(&cx).await })
        };

        mock.wait_for_deferred(1).await;
        let id = mock.deferred_ids()[0];
        cx.cancel();

        let err = task.await.unwrap().unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(err.as_transport().unwrap().delivery(), Delivery::Unknown);

        // The late response has nowhere to go.
        assert!(!mock.resolve(id, Reply::result(json!(null))));
        assert_eq!(mock.deferred_count(), 0);
    }

    #[tokio::test]
    async fn cancelled_before_dispatch_is_not_sent() {
        let mock = MockTransport::new();
        let device = Device::new(mock.clone());
        let cx = Context::background();
        cx.cancel();

        let err = device.cover(0).open(&cx).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(err.is_retry_safe());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expires_mid_flight() {
        let mock = MockTransport::new().with(
            "Cover.GetStatus",
            Reply::result(json!({"id": 0})).delayed(Duration::from_secs(30)),
        );
        let device = Device::new(mock);
        let cx = Context::background().with_timeout(Duration::from_secs(2));

        let err = device.cover(0).get_status(&cx).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.as_transport().unwrap().delivery(), Delivery::Unknown);
    }

    #[tokio::test]
    async fn out_of_order_responses_reach_their_callers() {
        let mock = MockTransport::new()
            .with("Cover.GetStatus", Reply::Deferred)
            .with("Switch.GetStatus", Reply::Deferred);
        let device = Device::new(mock.clone());

        let cover_task = {
            let cover = device.cover(0);
            tokio::spawn(async move { cover.get_status(&Context::background()).await })
        };
        mock.wait_for_deferred(1).await;
        let switch_task = {
            let switch = device.switch(0);
            tokio::spawn(async move { switch.get_status(&Context::background()).await })
        };
        mock.wait_for_deferred(2).await;

        let ids = mock.deferred_ids();
        assert_eq!(ids.len(), 2);
        let (cover_id, switch_id) = (ids[0], ids[1]);

        // Answer the later call first.
        assert!(mock.resolve(
            switch_id,
            Reply::result(json!({"id": 0, "output": true}))
        ));
        let switch = switch_task.await.unwrap().unwrap();
        assert!(switch.is_on());

        assert!(mock.resolve(
            cover_id,
            Reply::result(json!({"id": 0, "state": "closed", "current_pos": 0}))
        ));
        let cover = cover_task.await.unwrap().unwrap();
        assert_eq!(cover.state, Some(CoverState::Closed));
    }

    #[tokio::test]
    async fn many_concurrent_calls_each_get_their_own_result() {
        let mock = MockTransport::new();
        mock.fallback(Reply::Deferred);
        let client = Client::new(mock.clone());

        let tasks: Vec<_> = (0..8u32)
            .map(|n| {
                let client = client.clone();
                tokio::spawn(async move {
                    client
                        .call(
                            &Context::background(),
                            "Input.GetStatus",
                            Some(json!({"id": n})),
                        )
                        .await
                })
            })
            .collect();
        mock.wait_for_deferred(8).await;

        // Answer in reverse order, echoing each id back.
        for id in mock.deferred_ids().into_iter().rev() {
            assert!(mock.resolve(id, Reply::result(json!({"call": id}))));
        }

        let mut seen = Vec::new();
        for task in tasks {
            let value = task.await.unwrap().unwrap();
            seen.push(value["call"].as_u64().unwrap());
        }
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 8);
    }
}
