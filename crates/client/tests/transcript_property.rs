use proptest::prelude::*;
use ragdesk_client::chat::{IgnoreReason, PendingTicket, Resolution, Transcript};
use ragdesk_common::protocol::ChatAnswer;
use ragdesk_common::types::{ChatRole, Source};

#[derive(Debug, Clone)]
enum Op {
    Send(String),
    Answer,
    Fail,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => "[ a-z?\t\n]{0,12}".prop_map(Op::Send),
        1 => Just(Op::Answer),
        1 => Just(Op::Fail),
    ]
}

fn answer(n: usize) -> ChatAnswer {
    ChatAnswer {
        answer: format!("answer {n}"),
        sources: vec![Source {
            doc_id: None,
            filename: "a.pdf".to_string(),
            chunk_index: None,
            score: 0.5,
            preview: String::new(),
        }],
        duration_ms: Some(n as f64),
    }
}

fn run_ops(ops: &[Op]) {
    let mut transcript = Transcript::new();
    let mut ticket: Option<PendingTicket> = None;

    for (step, op) in ops.iter().enumerate() {
        let before = transcript.messages().to_vec();

        match op {
            Op::Send(query) => {
                let result = transcript.begin(query);
                if query.trim().is_empty() {
                    assert_eq!(result, Err(IgnoreReason::EmptyQuery));
                } else if ticket.is_some() {
                    assert_eq!(result, Err(IgnoreReason::Busy));
                } else {
                    ticket = Some(result.expect("idle transcript should accept a query"));
                    assert_eq!(transcript.pending_query(), Some(query.trim()));
                }
            }
            Op::Answer | Op::Fail => {
                if let Some(open) = ticket.take() {
                    let resolution = match op {
                        Op::Answer => Resolution::Answered(answer(step)),
                        _ => Resolution::Failed("Query failed".to_string()),
                    };
                    let appended =
                        transcript.resolve(open, resolution).expect("open ticket should resolve");
                    assert_ne!(appended.role, ChatRole::User);
                }
            }
        }

        let after = transcript.messages();
        assert!(after.len() <= before.len() + 1, "at most one message per step");
        assert_eq!(&after[..before.len()], before.as_slice(), "transcript is append-only");
        assert_eq!(transcript.is_pending(), ticket.is_some());

        let users = after.iter().filter(|m| m.role == ChatRole::User).count();
        let replies = after.len() - users;
        assert_eq!(users - replies, usize::from(transcript.is_pending()));
        assert!(after.iter().all(|m| !m.content.trim().is_empty()));
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn transcript_is_append_only_and_single_flight(ops in prop::collection::vec(op(), 0..60)) {
        run_ops(&ops);
    }
}

#[test]
fn alternating_send_and_answer_pairs_up() {
    let ops: Vec<Op> = (0..5).flat_map(|i| [Op::Send(format!("q{i}")), Op::Answer]).collect();
    run_ops(&ops);
}
