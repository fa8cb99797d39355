mod common;

use std::time::Duration;

use common::{DATABASE, TestCluster, accept_transaction, entity_type, person_answer, request};
use futures::StreamExt;
use graphwire::concept::TypeKind;
use graphwire::{ConnectionConfig, DriverError, ErrorKind, Options, SessionType, TransactionType};
use graphwire_rpc::proto::{
    self, concept_manager_req, concept_manager_res, transaction_req, transaction_res,
    transaction_res_part,
};

// ── Transaction lifecycle ──────────────────────────────────────

#[tokio::test]
async fn committed_transaction_is_closed() {
    let cluster = TestCluster::new("a:1729");
    let connection = cluster.connect().await;
    let session = connection
        .session(DATABASE, SessionType::Schema, Options::new())
        .await
        .unwrap();
    let a = cluster.server("a:1729");
    let (tx, mut server) = tokio::join!(
        session.transaction(TransactionType::Write, Options::new()),
        accept_transaction(&a),
    );
    let tx = tx.unwrap();

    let concepts = tx.concepts();
    let (person, ()) = tokio::join!(concepts.put_entity_type("person"), async {
        let put = server.next_request().await.unwrap();
        match request(&put) {
            transaction_req::Req::ConceptManagerReq(proto::ConceptManagerReq {
                req: Some(concept_manager_req::Req::PutEntityType(req)),
            }) => assert_eq!(req.label, "person"),
            other => panic!("unexpected request {other:?}"),
        }
        server.reply(
            put.req_id,
            transaction_res::Res::ConceptManagerRes(proto::ConceptManagerRes {
                res: Some(concept_manager_res::Res::Type(proto::TypeRes {
                    thing_type: Some(entity_type("person")),
                })),
            }),
        );
    });
    let person = person.unwrap();
    assert_eq!(person.kind, TypeKind::Entity);
    assert_eq!(person.label.to_string(), "person");

    let (committed, ()) = tokio::join!(tx.commit(), async {
        let commit = server.next_request().await.unwrap();
        assert!(matches!(request(&commit), transaction_req::Req::CommitReq(_)));
        server.reply(commit.req_id, transaction_res::Res::CommitRes(proto::CommitRes {}));
    });
    committed.unwrap();

    assert!(!tx.is_open());
    let err = concepts.get_thing_type("person").await.unwrap_err();
    assert_eq!(err, DriverError::TransactionClosed);
    assert_eq!(tx.commit().await.unwrap_err(), DriverError::TransactionClosed);
    // Nothing reached the server after the commit.
    assert!(server.next_request().await.is_none());
}

#[tokio::test]
async fn dropped_answer_stream_is_cancelled_once() {
    let cluster = TestCluster::new("a:1729");
    let connection = cluster.connect().await;
    let session = connection
        .session(DATABASE, SessionType::Data, Options::new())
        .await
        .unwrap();
    let a = cluster.server("a:1729");
    let (tx, mut server) = tokio::join!(
        session.transaction(TransactionType::Read, Options::new()),
        accept_transaction(&a),
    );
    let tx = tx.unwrap();

    let queries = tx.query();
    let mut answers = queries.match_("match $x isa person;").unwrap();
    let query = server.next_request().await.unwrap();
    assert!(matches!(request(&query), transaction_req::Req::QueryManagerReq(_)));
    let part = |n| {
        transaction_res_part::Res::QueryManagerResPart(proto::QueryManagerResPart {
            answers: vec![person_answer(n)],
        })
    };
    server.part(query.req_id, part(0));
    server.continue_(query.req_id);

    let first = answers.next().await.unwrap().unwrap();
    assert_eq!(first.get("x").unwrap().as_thing().unwrap().iid, vec![0]);
    drop(answers);

    let cancel = server.next_request().await.unwrap();
    assert_eq!(cancel.req_id, query.req_id);
    assert!(matches!(request(&cancel), transaction_req::Req::CancelReq(_)));
    assert!(server.try_next_request().is_none());

    // Parts still in flight for the cancelled request are ignored.
    server.part(query.req_id, part(1));
    server.part(query.req_id, part(2));
    server.done(query.req_id);

    let (defined, ()) = tokio::join!(queries.define("define age sub attribute;"), async {
        let define = server.next_request().await.unwrap();
        assert_ne!(define.req_id, query.req_id);
        server.reply(
            define.req_id,
            transaction_res::Res::QueryManagerRes(proto::QueryManagerRes { aggregate: None }),
        );
    });
    defined.unwrap();
    assert!(tx.is_open());
}

#[tokio::test]
async fn aggregate_answer_is_decoded() {
    let cluster = TestCluster::new("a:1729");
    let connection = cluster.connect().await;
    let session = connection
        .session(DATABASE, SessionType::Data, Options::new())
        .await
        .unwrap();
    let a = cluster.server("a:1729");
    let (tx, mut server) = tokio::join!(
        session.transaction(TransactionType::Read, Options::new().infer(true)),
        accept_transaction(&a),
    );
    let tx = tx.unwrap();

    let queries = tx.query();
    let count = queries.match_aggregate("match $x isa person; count;");
    let (count, ()) = tokio::join!(count, async {
        let query = server.next_request().await.unwrap();
        match request(&query) {
            transaction_req::Req::QueryManagerReq(req) => {
                assert_eq!(req.kind, proto::QueryKind::MatchAggregate as i32);
                assert_eq!(req.options.as_ref().unwrap().infer, Some(true));
            }
            other => panic!("unexpected request {other:?}"),
        }
        server.reply(
            query.req_id,
            transaction_res::Res::QueryManagerRes(proto::QueryManagerRes {
                aggregate: Some(proto::Numeric {
                    value: Some(proto::numeric::Value::LongValue(3)),
                }),
            }),
        );
    });
    assert_eq!(count.unwrap(), graphwire::Numeric::Long(3));
}

#[tokio::test]
async fn failed_commit_still_closes_the_transaction() {
    let cluster = TestCluster::new("a:1729");
    let connection = cluster.connect().await;
    let session = connection
        .session(DATABASE, SessionType::Data, Options::new())
        .await
        .unwrap();
    let a = cluster.server("a:1729");
    let (tx, mut server) = tokio::join!(
        session.transaction(TransactionType::Write, Options::new()),
        accept_transaction(&a),
    );
    let tx = tx.unwrap();

    let (committed, ()) = tokio::join!(tx.commit(), async {
        let commit = server.next_request().await.unwrap();
        assert!(matches!(request(&commit), transaction_req::Req::CommitReq(_)));
        server.error(commit.req_id, "TXN08", "commit conflict");
    });
    let err = committed.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Server);

    assert!(!tx.is_open());
    let err = tx.concepts().get_thing_type("person").await.unwrap_err();
    assert_eq!(err, DriverError::TransactionClosed);
    assert!(server.next_request().await.is_none());
}

#[tokio::test]
async fn rollback_is_acknowledged_and_closes() {
    let cluster = TestCluster::new("a:1729");
    let connection = cluster.connect().await;
    let session = connection
        .session(DATABASE, SessionType::Data, Options::new())
        .await
        .unwrap();
    let a = cluster.server("a:1729");
    let (tx, mut server) = tokio::join!(
        session.transaction(TransactionType::Write, Options::new()),
        accept_transaction(&a),
    );
    let tx = tx.unwrap();

    let (rolled_back, ()) = tokio::join!(tx.rollback(), async {
        let rollback = server.next_request().await.unwrap();
        assert!(matches!(request(&rollback), transaction_req::Req::RollbackReq(_)));
        server.reply(
            rollback.req_id,
            transaction_res::Res::RollbackRes(proto::RollbackRes {}),
        );
    });
    rolled_back.unwrap();
    assert!(!tx.is_open());
    tx.rollback().await.unwrap();
}

#[tokio::test]
async fn rollback_on_a_broken_stream_still_closes() {
    let cluster = TestCluster::new("a:1729");
    let connection = cluster.connect().await;
    let session = connection
        .session(DATABASE, SessionType::Data, Options::new())
        .await
        .unwrap();
    let a = cluster.server("a:1729");
    let (tx, server) = tokio::join!(
        session.transaction(TransactionType::Write, Options::new()),
        accept_transaction(&a),
    );
    let tx = tx.unwrap();

    server.fail(DriverError::Transport("connection reset".into()));
    tx.rollback().await.unwrap();

    assert!(!tx.is_open());
    let err = tx.query().define("define age sub attribute;").await.unwrap_err();
    assert_eq!(err, DriverError::TransactionClosed);
}

#[tokio::test]
async fn closing_twice_is_a_no_op() {
    let cluster = TestCluster::new("a:1729");
    let connection = cluster.connect().await;
    let session = connection
        .session(DATABASE, SessionType::Data, Options::new())
        .await
        .unwrap();
    let a = cluster.server("a:1729");
    let (tx, mut server) = tokio::join!(
        session.transaction(TransactionType::Read, Options::new()),
        accept_transaction(&a),
    );
    let tx = tx.unwrap();

    tx.close();
    assert!(!tx.is_open());
    tx.close();
    assert!(!tx.is_open());
    assert!(session.is_open());

    let err = tx.concepts().get_thing_type("person").await.unwrap_err();
    assert_eq!(err, DriverError::TransactionClosed);
    assert!(server.next_request().await.is_none());
}

#[tokio::test]
async fn undecodable_part_ends_the_answer_stream() {
    let cluster = TestCluster::new("a:1729");
    let connection = cluster.connect().await;
    let session = connection
        .session(DATABASE, SessionType::Data, Options::new())
        .await
        .unwrap();
    let a = cluster.server("a:1729");
    let (tx, mut server) = tokio::join!(
        session.transaction(TransactionType::Read, Options::new()),
        accept_transaction(&a),
    );
    let tx = tx.unwrap();

    let queries = tx.query();
    let answers = queries.match_("match $x isa person;").unwrap();
    let query = server.next_request().await.unwrap();
    let part = |n| {
        transaction_res_part::Res::QueryManagerResPart(proto::QueryManagerResPart {
            answers: vec![person_answer(n)],
        })
    };
    server.part(query.req_id, part(0));
    server.part(
        query.req_id,
        transaction_res_part::Res::ThingResPart(proto::ThingResPart::default()),
    );
    server.part(query.req_id, part(2));
    server.done(query.req_id);

    let answers: Vec<_> = answers.collect().await;
    assert_eq!(answers.len(), 2);
    assert!(answers[0].is_ok());
    assert_eq!(answers[1].as_ref().unwrap_err().kind(), ErrorKind::Protocol);
}

// ── Sessions ───────────────────────────────────────────────────

#[tokio::test]
async fn session_close_is_idempotent_and_closes_transactions() {
    let cluster = TestCluster::new("a:1729");
    let connection = cluster.connect().await;
    let session = connection
        .session(DATABASE, SessionType::Data, Options::new())
        .await
        .unwrap();
    let a = cluster.server("a:1729");
    let (tx, mut server) = tokio::join!(
        session.transaction(TransactionType::Write, Options::new()),
        accept_transaction(&a),
    );
    let tx = tx.unwrap();

    session.close().await;
    session.close().await;
    assert!(!session.is_open());
    assert_eq!(cluster.calls("session_close"), 1);

    let err = tx.query().define("define x sub entity;").await.unwrap_err();
    assert_eq!(err, DriverError::SessionClosed);
    assert!(!tx.is_open());
    assert!(server.next_request().await.is_none());

    let err = session
        .transaction(TransactionType::Read, Options::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SessionClosed);
}

#[tokio::test]
async fn pulse_keeps_a_live_session_open() {
    let cluster = TestCluster::new("a:1729");
    let connection = cluster
        .connect_with(ConnectionConfig {
            pulse_interval: Duration::from_millis(10),
        })
        .await;
    let session = connection
        .session(DATABASE, SessionType::Data, Options::new())
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(session.is_open());
    assert!(cluster.calls("session_pulse") >= 1);
}

#[tokio::test]
async fn pulse_answered_dead_closes_the_session() {
    let cluster = TestCluster::new("a:1729");
    let connection = cluster
        .connect_with(ConnectionConfig {
            pulse_interval: Duration::from_millis(10),
        })
        .await;
    let session = connection
        .session(DATABASE, SessionType::Data, Options::new())
        .await
        .unwrap();

    cluster.set_alive(false);
    for _ in 0..200 {
        if !session.is_open() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(!session.is_open());

    let err = session
        .transaction(TransactionType::Read, Options::new())
        .await
        .unwrap_err();
    assert_eq!(err, DriverError::SessionClosed);
}

#[tokio::test]
async fn transaction_open_follows_a_new_primary() {
    let cluster = TestCluster::new("a:1729");
    let connection = cluster.connect().await;
    let session = connection
        .session(DATABASE, SessionType::Schema, Options::new())
        .await
        .unwrap();
    assert_eq!(session.address(), "a:1729");

    cluster.elect("b:1729", 2);
    let b = cluster.server("b:1729");
    let (tx, _server) = tokio::join!(
        session.transaction(TransactionType::Write, Options::new()),
        accept_transaction(&b),
    );

    assert!(tx.unwrap().is_open());
    assert_eq!(session.address(), "b:1729");
    assert_eq!(b.call_count("session_open"), 1);
}

#[tokio::test]
async fn transaction_open_without_reachable_primary_is_unavailable() {
    let cluster = TestCluster::new("a:1729");
    let connection = cluster.connect().await;
    let session = connection
        .session(DATABASE, SessionType::Schema, Options::new())
        .await
        .unwrap();

    cluster.elect("gone:1729", 2);
    let err = session
        .transaction(TransactionType::Write, Options::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Availability);
}

// ── Connection ─────────────────────────────────────────────────

#[tokio::test]
async fn closing_the_connection_closes_its_sessions() {
    let cluster = TestCluster::new("a:1729");
    let connection = cluster.connect().await;
    let data = connection
        .session(DATABASE, SessionType::Data, Options::new())
        .await
        .unwrap();
    let schema = connection
        .session(DATABASE, SessionType::Schema, Options::new())
        .await
        .unwrap();

    connection.close().await;
    connection.close().await;

    assert!(!connection.is_open());
    assert!(!data.is_open());
    assert!(!schema.is_open());
    assert_eq!(cluster.calls("session_close"), 2);

    let err = connection
        .session(DATABASE, SessionType::Data, Options::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Availability);
}
