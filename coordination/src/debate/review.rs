//! Peer-review message construction.
//!
//! At the start of every round after the first, each agent receives one user
//! message quoting the other agents' answers from the previous round, followed
//! by the restated question.

use thiserror::Error;

use super::message::{AgentContext, Message, Role};

/// Contract violations while reading peer contexts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewError {
    /// Round 0 has no previous answers to review.
    #[error("round {0} has no previous round to review")]
    NoPreviousRound(usize),

    #[error("peer agent {peer} has no message at offset {offset} (context length {len})")]
    MissingPeerMessage {
        peer: usize,
        offset: usize,
        len: usize,
    },

    #[error("peer agent {peer} message at offset {offset} has role {role}, expected assistant")]
    UnexpectedRole {
        peer: usize,
        offset: usize,
        role: Role,
    },
}

/// Offset of the previous round's assistant turn for a debate in `round`.
///
/// Contexts are laid out as `[seed, a0, r1, a1, r2, a2, ..]`, so the answer
/// given in round `round - 1` sits at `2 * round - 1`.
pub fn last_assistant_offset(round: usize) -> Result<usize, ReviewError> {
    if round == 0 {
        return Err(ReviewError::NoPreviousRound(round));
    }
    Ok(2 * round - 1)
}

/// Build the review message for one agent from its peers' contexts.
///
/// `peers` yields `(agent index, context)` pairs and must not include the
/// receiving agent. With no peers the agent is asked to double-check its own
/// previous answer instead.
pub fn construct_review_message<'a, I>(
    peers: I,
    question_prompt: &str,
    round: usize,
) -> Result<Message, ReviewError>
where
    I: IntoIterator<Item = (usize, &'a AgentContext)>,
{
    let offset = last_assistant_offset(round)?;

    let mut excerpts = Vec::new();
    for (peer, context) in peers {
        let message = context
            .get(offset)
            .ok_or(ReviewError::MissingPeerMessage {
                peer,
                offset,
                len: context.len(),
            })?;
        if !message.is_assistant() {
            return Err(ReviewError::UnexpectedRole {
                peer,
                offset,
                role: message.role,
            });
        }
        excerpts.push(message.text());
    }

    if excerpts.is_empty() {
        return Ok(Message::user(format!(
            "Can you double check that your answer is correct? {}\n\
             Make sure to state your final answer at the end of the response.",
            question_prompt.trim()
        )));
    }

    let mut text = String::from("These are the recent answers from other agents:");
    for excerpt in excerpts {
        text.push_str("\n\nOne agent's response: ```");
        text.push_str(excerpt);
        text.push_str("```");
    }
    text.push_str(
        "\n\nUse the reasoning from other agents as additional advice and give an updated answer. \
         Examine your solution and the solutions of the other agents step by step.\n",
    );
    text.push_str(question_prompt.trim());
    text.push_str("\nMake sure to state your final answer at the end of the response.");

    Ok(Message::user(text))
}
