//! Per-request conversation memory.
//!
//! One `ConversationMemory` is built per inbound request by replaying the
//! request's history, read by the adapter when it assembles the backend
//! context, and dropped at the end of the call. Nothing here is shared
//! across requests.
//!
//! Turns go through a two-phase builder: [`ConversationMemory::open_turn`]
//! records the user input and hands back a [`TurnHandle`]; the reply is
//! attached with [`ConversationMemory::close_turn`], which consumes the
//! handle. A reply without a handle has nowhere to go, so the
//! reply-must-follow-an-open-turn invariant holds by construction.

// ─────────────────────────────────────────────
// Turns
// ─────────────────────────────────────────────

/// One input/output pair in the conversation history.
///
/// `output` is `None` while the turn is open (the user spoke, nobody has
/// answered yet).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    pub input: String,
    pub output: Option<String>,
}

impl Turn {
    /// The reply text, or empty when the turn is still open.
    pub fn output_or_empty(&self) -> &str {
        self.output.as_deref().unwrap_or("")
    }
}

/// Proof that a turn was opened and not yet closed.
///
/// Not `Clone`/`Copy`: closing consumes it, so a turn can be completed at
/// most once.
#[derive(Debug)]
#[must_use = "an open turn should either be closed or deliberately left open"]
pub struct TurnHandle {
    index: usize,
}

// ─────────────────────────────────────────────
// ConversationMemory
// ─────────────────────────────────────────────

/// Ordered record of a conversation, plus an optional system instruction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConversationMemory {
    system_instruction: Option<String>,
    turns: Vec<Turn>,
}

impl ConversationMemory {
    /// Fresh, empty memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record or replace the system instruction. Last write wins.
    pub fn set_system_instruction(&mut self, text: impl Into<String>) {
        self.system_instruction = Some(text.into());
    }

    /// The effective system instruction, if any was recorded.
    pub fn system_instruction(&self) -> Option<&str> {
        self.system_instruction.as_deref()
    }

    /// Start a turn with the given user input.
    ///
    /// An earlier turn that was never closed simply stays open; it renders
    /// with an empty reply slot.
    pub fn open_turn(&mut self, input: impl Into<String>) -> TurnHandle {
        self.turns.push(Turn {
            input: input.into(),
            output: None,
        });
        TurnHandle {
            index: self.turns.len() - 1,
        }
    }

    /// Attach the reply to a previously opened turn, completing it.
    pub fn close_turn(&mut self, handle: TurnHandle, output: impl Into<String>) {
        // The handle is only minted by open_turn and consumed here, so the
        // slot exists and is still empty.
        self.turns[handle.index].output = Some(output.into());
    }

    /// Ordered view of the recorded turns, oldest first.
    pub fn as_prompt_context(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of recorded turns, open or closed.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether no turns and no system instruction are recorded.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty() && self.system_instruction.is_none()
    }

    /// Reset to the empty state. Used between independent requests, never
    /// mid-request.
    pub fn clear(&mut self) {
        self.system_instruction = None;
        self.turns.clear();
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
