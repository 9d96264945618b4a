//! End-to-end tests over a route guide service.
//!
//! Calls go through the router and an in-memory stream pair, the way a
//! transport server would drive a decoded call.

use std::sync::Arc;

use protoflux::mem;
use protoflux::prelude::*;
use protoflux::{DispatchError, Router, try_stream};

const OFFSET: i32 = 2;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    latitude: i32,
    longitude: i32,
}
impl Message for Point {}

#[derive(Debug)]
struct Rectangle {
    lo: Point,
    hi: Point,
}
impl Message for Rectangle {}

#[derive(Debug)]
struct Feature {
    name: String,
    location: Point,
}
impl Message for Feature {}

#[derive(Debug, PartialEq)]
struct RouteSummary {
    point_count: u32,
}
impl Message for RouteSummary {}

#[derive(Debug, PartialEq)]
struct RouteNote {
    location: Point,
    message: String,
}
impl Message for RouteNote {}

struct RouteGuide {
    offset: i32,
}

impl RouteGuide {
    async fn get_feature(self: Arc<Self>, request: Point) -> Result<Feature, RpcError> {
        Ok(Feature {
            name: "Test".into(),
            location: Point {
                latitude: request.latitude + self.offset,
                longitude: request.longitude + self.offset,
            },
        })
    }

    async fn list_f(
        self: Arc<Self>,
        request: Rectangle,
    ) -> Result<ResponseStream<Feature>, RpcError> {
        let offset = self.offset;
        Ok(ResponseStream::new(try_stream! {
            for lat in request.lo.latitude..request.hi.latitude {
                yield Feature {
                    name: "Test2".into(),
                    location: Point {
                        latitude: lat + offset,
                        longitude: request.lo.longitude + offset,
                    },
                };
            }
        }))
    }

    async fn record_route(
        self: Arc<Self>,
        mut points: Streaming<Point>,
    ) -> Result<RouteSummary, RpcError> {
        let mut point_count = 0;
        while let Some(_point) = points.message().await? {
            point_count += 1;
        }
        Ok(RouteSummary { point_count })
    }

    async fn route_chat(
        self: Arc<Self>,
        notes: Streaming<RouteNote>,
    ) -> Result<ResponseStream<RouteNote>, RpcError> {
        Ok(ResponseStream::new(notes.map(|note| {
            note.map(|note| RouteNote {
                message: format!("re: {}", note.message),
                ..note
            })
        })))
    }
}

fn route_guide() -> protoflux::Service<RouteGuide> {
    rpc_service("routeguide.RouteGuide", RouteGuide { offset: OFFSET })
        .handler(handler!(RouteGuide::get_feature))
        .unwrap()
        .handler(handler!(RouteGuide::list_f).with_rpc_name("ListFeatures"))
        .unwrap()
        .handler(handler!(RouteGuide::record_route))
        .unwrap()
        .handler(handler!(RouteGuide::route_chat))
        .unwrap()
}

fn router() -> Router {
    let mut router = Router::new();
    router.add_service(&route_guide()).unwrap();
    router
}

#[test]
fn routes_and_cardinalities() {
    let mapping = route_guide().mapping().unwrap();
    let routes: Vec<(&str, Cardinality)> = mapping
        .iter()
        .map(|(path, entry)| (path.as_str(), entry.cardinality))
        .collect();

    assert_eq!(
        routes,
        vec![
            ("/routeguide.RouteGuide/GetFeature", Cardinality::UnaryUnary),
            ("/routeguide.RouteGuide/ListFeatures", Cardinality::UnaryStream),
            ("/routeguide.RouteGuide/RecordRoute", Cardinality::StreamUnary),
            ("/routeguide.RouteGuide/RouteChat", Cardinality::StreamStream),
        ]
    );

    let list = &mapping["/routeguide.RouteGuide/ListFeatures"];
    assert!(list.request_type.is::<Rectangle>());
    assert!(list.response_type.is::<Feature>());
}

#[tokio_test_lite::test]
async fn get_feature() {
    init_tracing();
    let router = router();
    let (mut client, stream) = mem::pair();

    client
        .send(Point {
            latitude: 10,
            longitude: 20,
        })
        .await
        .unwrap();
    client.finish();
    router
        .dispatch("/routeguide.RouteGuide/GetFeature", stream)
        .await
        .unwrap();

    let features = client.collect::<Feature>().await.unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0].name, "Test");
    assert_eq!(
        features[0].location,
        Point {
            latitude: 10 + OFFSET,
            longitude: 20 + OFFSET,
        }
    );
}

#[tokio_test_lite::test]
async fn list_features_streams_in_order() {
    init_tracing();
    let router = router();
    let (mut client, stream) = mem::pair();

    client
        .send(Rectangle {
            lo: Point {
                latitude: 10,
                longitude: 20,
            },
            hi: Point {
                latitude: 20,
                longitude: 20,
            },
        })
        .await
        .unwrap();
    client.finish();
    router
        .dispatch("/routeguide.RouteGuide/ListFeatures", stream)
        .await
        .unwrap();

    let features = client.collect::<Feature>().await.unwrap();
    assert_eq!(features.len(), 20 - 10);
    let latitudes: Vec<i32> = features.iter().map(|f| f.location.latitude).collect();
    let expected: Vec<i32> = (10..20).map(|lat| lat + OFFSET).collect();
    assert_eq!(latitudes, expected);
    assert!(features.iter().all(|f| f.location.longitude == 20 + OFFSET));
}

#[tokio_test_lite::test]
async fn record_route_counts_every_point() {
    let router = router();
    let (mut client, stream) = mem::pair();

    for latitude in 0..5 {
        client
            .send(Point {
                latitude,
                longitude: 0,
            })
            .await
            .unwrap();
    }
    client.finish();
    router
        .dispatch("/routeguide.RouteGuide/RecordRoute", stream)
        .await
        .unwrap();

    assert_eq!(
        client.collect::<RouteSummary>().await.unwrap(),
        vec![RouteSummary { point_count: 5 }]
    );
}

#[tokio_test_lite::test]
async fn route_chat_answers_each_note() {
    let router = router();
    let (mut client, stream) = mem::pair();

    for (latitude, message) in [(1, "first"), (2, "second")] {
        client
            .send(RouteNote {
                location: Point {
                    latitude,
                    longitude: 0,
                },
                message: message.into(),
            })
            .await
            .unwrap();
    }
    client.finish();
    router
        .dispatch("/routeguide.RouteGuide/RouteChat", stream)
        .await
        .unwrap();

    let replies: Vec<String> = client
        .collect::<RouteNote>()
        .await
        .unwrap()
        .into_iter()
        .map(|note| note.message)
        .collect();
    assert_eq!(replies, vec!["re: first", "re: second"]);
}

#[tokio_test_lite::test]
async fn unary_call_without_request_fails() {
    let router = router();
    let (mut client, stream) = mem::pair();
    client.finish();

    let err = router
        .dispatch("/routeguide.RouteGuide/GetFeature", stream)
        .await
        .unwrap_err();
    assert_eq!(err, DispatchError::Rpc(RpcError::MissingRequest));
    assert_eq!(err.to_string(), "rpc failed: stream ended before the request message");
}

#[tokio_test_lite::test]
async fn wrong_request_type_is_rejected() {
    let router = router();
    let (mut client, stream) = mem::pair();
    client.send(RouteSummary { point_count: 1 }).await.unwrap();
    client.finish();

    let err = router
        .dispatch("/routeguide.RouteGuide/GetFeature", stream)
        .await
        .unwrap_err();
    match err {
        DispatchError::Rpc(RpcError::UnexpectedMessage { expected, found }) => {
            assert!(expected.is::<Point>());
            assert!(found.ends_with("RouteSummary"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
