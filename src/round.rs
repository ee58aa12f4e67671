//! One round of play
//!
//! A round announces its question, runs an answer collector for every active
//! participant in parallel, waits at a rendezvous barrier until every
//! collector has resolved, and then scores all answers concurrently.

use std::{sync::Arc, time::Duration};

use itertools::Itertools;
use tokio::sync::Barrier;

use crate::{
    Error,
    collector::Collector,
    console::{Inputs, LineSource},
    participant::{Id, Participant},
    quiz::question::{OptionKey, Question},
    session::{Tunnel, UpdateMessage},
};

/// A single round over one question
///
/// Participants are moved into the round's worker tasks, so each record has
/// exactly one owner while the round runs, and handed back once every worker
/// has been joined.
pub struct Round<T: Tunnel> {
    /// 0-based index of the round
    index: usize,
    /// Total number of rounds in the session
    count: usize,
    /// The question of this round
    question: Arc<Question>,
    /// Narration sink shared by every worker
    tunnel: Arc<T>,
    /// Time each participant has to answer
    time_limit: Duration,
}

impl<T: Tunnel + 'static> Round<T> {
    /// Creates a round
    ///
    /// # Arguments
    ///
    /// * `index` - 0-based index of the round
    /// * `count` - Total number of rounds in the session
    /// * `question` - The question to ask
    /// * `tunnel` - Narration sink
    /// * `time_limit` - Time each participant has to answer
    pub fn new(
        index: usize,
        count: usize,
        question: Question,
        tunnel: Arc<T>,
        time_limit: Duration,
    ) -> Self {
        Self {
            index,
            count,
            question: Arc::new(question),
            tunnel,
            time_limit,
        }
    }

    /// Plays the round to completion
    ///
    /// # Arguments
    ///
    /// * `participants` - The active participants, in seat order
    /// * `inputs` - Where each seat reads its lines from
    /// * `rng` - Source of randomness, forked for every collector
    ///
    /// # Returns
    ///
    /// The points each participant earned this round, in seat order
    ///
    /// # Errors
    ///
    /// * `Error::UnroutedSeat` - A participant's seat has no input source;
    ///   the round does not start and `participants` is left untouched
    /// * `Error::Worker` - A collector or scoring task panicked
    pub async fn play(
        &self,
        participants: &mut Vec<Participant>,
        inputs: &Inputs,
        rng: &mut fastrand::Rng,
    ) -> Result<Vec<(Id, u64)>, Error> {
        let sources = participants
            .iter()
            .map(|p| {
                inputs
                    .for_seat(p.seat())
                    .ok_or(Error::UnroutedSeat(p.seat()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.tunnel.send_message(&UpdateMessage::RoundAnnouncement {
            index: self.index,
            count: self.count,
            question: self.question.text().to_owned(),
        });
        self.tunnel.send_message(&UpdateMessage::OptionListing {
            options: self.question.visible_options(|_| false),
        });

        let answered = self
            .collect(std::mem::take(participants), sources, rng)
            .await?;

        self.tunnel.send_message(&UpdateMessage::ResultsHeader { index: self.index });
        let (scored, points) = self.evaluate(answered).await?;
        *participants = scored;

        self.tunnel.send_message(&UpdateMessage::Standings {
            scores: participants
                .iter()
                .map(|p| (p.name().to_owned(), p.score()))
                .collect_vec(),
        });

        Ok(points)
    }

    /// Runs one collector per participant and waits for all of them
    ///
    /// Every collector waits at the barrier after resolving, so none of them
    /// returns its participant before the slowest one is done.
    async fn collect(
        &self,
        participants: Vec<Participant>,
        sources: Vec<LineSource>,
        rng: &mut fastrand::Rng,
    ) -> Result<Vec<Participant>, Error> {
        let barrier = Arc::new(Barrier::new(participants.len()));

        let handles = participants
            .into_iter()
            .zip(sources)
            .map(|(mut participant, input)| {
                let question = self.question.clone();
                let tunnel = self.tunnel.clone();
                let barrier = barrier.clone();
                let rng = rng.fork();
                let time_limit = self.time_limit;
                tokio::spawn(async move {
                    let state =
                        Collector::new(&mut participant, &question, &input, &*tunnel, rng)
                            .run(time_limit)
                            .await;
                    log::debug!("{} resolved as {state:?}", participant.name());
                    barrier.wait().await;
                    participant
                })
            })
            .collect_vec();

        let mut collected = Vec::with_capacity(handles.len());
        for handle in handles {
            collected.push(handle.await?);
        }
        Ok(collected)
    }

    /// Scores every participant's answer concurrently
    ///
    /// # Returns
    ///
    /// The participants with updated scores and the points each one earned,
    /// both in the order given
    ///
    /// # Errors
    ///
    /// * `Error::Worker` - A scoring task panicked
    pub async fn evaluate(
        &self,
        participants: Vec<Participant>,
    ) -> Result<(Vec<Participant>, Vec<(Id, u64)>), Error> {
        evaluate(participants, self.question.correct(), &self.tunnel).await
    }
}

/// Scores answers against the correct key, one task per participant
///
/// Each task narrates its own verdict. All tasks are joined before returning.
///
/// # Arguments
///
/// * `participants` - Participants whose last answer is final
/// * `correct` - The correct key of the round's question
/// * `tunnel` - Narration sink
///
/// # Errors
///
/// * `Error::Worker` - A scoring task panicked
pub async fn evaluate<T: Tunnel + 'static>(
    participants: Vec<Participant>,
    correct: OptionKey,
    tunnel: &Arc<T>,
) -> Result<(Vec<Participant>, Vec<(Id, u64)>), Error> {
    let handles = participants
        .into_iter()
        .map(|mut participant| {
            let tunnel = tunnel.clone();
            tokio::spawn(async move {
                let awarded = participant.score_answer(correct);
                tunnel.send_message(&UpdateMessage::Verdict {
                    name: participant.name().to_owned(),
                    answer: participant.last_answer(),
                    awarded,
                });
                (participant, awarded)
            })
        })
        .collect_vec();

    let mut scored = Vec::with_capacity(handles.len());
    let mut points = Vec::with_capacity(handles.len());
    for handle in handles {
        let (participant, awarded) = handle.await?;
        points.push((participant.id(), awarded));
        scored.push(participant);
    }
    Ok((scored, points))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use tokio::time::Instant;

    use super::*;
    use crate::{quiz::assist::Assist, session::RecordingTunnel};

    fn create_test_question() -> Question {
        Question::new(
            "Which planet is known as the Red Planet?",
            [
                (OptionKey::A, "Earth"),
                (OptionKey::B, "Mars"),
                (OptionKey::C, "Jupiter"),
                (OptionKey::D, "Venus"),
            ],
            OptionKey::B,
        )
    }

    fn seated(count: usize) -> Vec<Participant> {
        (1..=count)
            .map(|seat| {
                let mut participant = Participant::new(seat);
                participant.activate();
                participant
            })
            .collect()
    }

    const LIMIT: Duration = Duration::from_secs(30);

    #[tokio::test(start_paused = true)]
    async fn test_round_answer_and_silence() {
        let (tx1, source1) = LineSource::channel();
        let (_tx2, source2) = LineSource::channel();
        let inputs = Inputs::PerSeat(vec![source1, source2]);
        tx1.send("b".to_string()).unwrap();

        let tunnel = Arc::new(RecordingTunnel::default());
        let round = Round::new(0, 1, create_test_question(), tunnel.clone(), LIMIT);
        let mut participants = seated(2);
        let mut rng = fastrand::Rng::with_seed(5);

        let started = Instant::now();
        let points = round
            .play(&mut participants, &inputs, &mut rng)
            .await
            .unwrap();

        assert_eq!(started.elapsed(), LIMIT);
        assert_eq!(participants[0].score(), 10);
        assert_eq!(participants[1].score(), 0);
        assert_eq!(participants[1].last_answer(), None);
        assert_eq!(
            points,
            vec![(participants[0].id(), 10), (participants[1].id(), 0)]
        );
        assert_eq!(
            tunnel.messages().last(),
            Some(&UpdateMessage::Standings {
                scores: vec![("Player 1".to_string(), 10), ("Player 2".to_string(), 0)]
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_verdict_before_every_collector_resolves() {
        let (tx1, source1) = LineSource::channel();
        let (_tx2, source2) = LineSource::channel();
        let inputs = Inputs::PerSeat(vec![source1, source2]);
        tx1.send("b".to_string()).unwrap();

        let tunnel = Arc::new(RecordingTunnel::default());
        let round = Round::new(0, 1, create_test_question(), tunnel.clone(), LIMIT);
        let mut participants = seated(2);

        round
            .play(&mut participants, &inputs, &mut fastrand::Rng::with_seed(5))
            .await
            .unwrap();

        let messages = tunnel.messages();
        let time_up = messages
            .iter()
            .position(|m| matches!(m, UpdateMessage::TimeUp { .. }))
            .unwrap();
        let first_verdict = messages
            .iter()
            .position(|m| matches!(m, UpdateMessage::Verdict { .. }))
            .unwrap();
        assert!(time_up < first_verdict);
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_shared_input() {
        let (tx, source) = LineSource::channel();
        let inputs = Inputs::Shared(source);
        for line in ["B", "b", "c"] {
            tx.send(line.to_string()).unwrap();
        }

        let tunnel = Arc::new(RecordingTunnel::default());
        let round = Round::new(1, 3, create_test_question(), tunnel.clone(), LIMIT);
        let mut participants = seated(3);

        let started = Instant::now();
        let points = round
            .play(&mut participants, &inputs, &mut fastrand::Rng::with_seed(9))
            .await
            .unwrap();

        assert!(started.elapsed() < LIMIT);
        assert_eq!(points.iter().map(|(_, p)| p).sum::<u64>(), 20);
        assert_eq!(
            participants.iter().map(Participant::seat).collect_vec(),
            vec![1, 2, 3]
        );
        assert_eq!(
            tunnel.count(|m| *m
                == UpdateMessage::RoundAnnouncement {
                    index: 1,
                    count: 3,
                    question: "Which planet is known as the Red Planet?".to_string(),
                }),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_unrouted_seat() {
        let (_tx, source) = LineSource::channel();
        let inputs = Inputs::PerSeat(vec![source]);
        let tunnel = Arc::new(RecordingTunnel::default());
        let round = Round::new(0, 1, create_test_question(), tunnel.clone(), LIMIT);
        let mut participants = seated(2);
        participants[0].claim_assist(Assist::FiftyFifty);
        let before = participants.clone();

        let result = round
            .play(&mut participants, &inputs, &mut fastrand::Rng::with_seed(1))
            .await;

        assert!(matches!(result, Err(Error::UnroutedSeat(2))));
        assert_eq!(participants, before);
        assert!(participants[0].has_used(Assist::FiftyFifty));
        assert!(tunnel.messages().is_empty());
    }

    #[tokio::test]
    async fn test_evaluate_scores_each_answer() {
        let tunnel = Arc::new(RecordingTunnel::default());
        let mut participants = seated(3);
        participants[0].set_last_answer(Some(OptionKey::B));
        participants[1].set_last_answer(Some(OptionKey::A));
        participants[2].set_last_answer(None);

        let (scored, points) = evaluate(participants, OptionKey::B, &tunnel).await.unwrap();

        assert_eq!(
            scored.iter().map(Participant::score).collect_vec(),
            vec![10, 0, 0]
        );
        assert_eq!(points.iter().map(|(_, p)| *p).collect_vec(), vec![10, 0, 0]);
        assert_eq!(
            tunnel.count(|m| matches!(m, UpdateMessage::Verdict { .. })),
            3
        );
        assert_eq!(
            tunnel.count(|m| *m
                == UpdateMessage::Verdict {
                    name: "Player 3".to_string(),
                    answer: None,
                    awarded: 0,
                }),
            1
        );
    }

    #[tokio::test]
    async fn test_evaluate_accumulates_in_steps_of_ten() {
        let tunnel = Arc::new(RecordingTunnel::default());
        let mut participants = seated(1);

        for _ in 0..3 {
            participants[0].set_last_answer(Some(OptionKey::C));
            let (scored, _) = evaluate(participants, OptionKey::C, &tunnel).await.unwrap();
            participants = scored;
        }

        assert_eq!(participants[0].score(), 30);
        assert_eq!(participants[0].score() % 10, 0);
    }
}
