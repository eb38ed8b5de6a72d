//! Context assembly: what gets rendered into each prompt, and how model
//! output is cleaned on the way back.
//!
//! | Piece | Source | Window |
//! |-------|--------|--------|
//! | Conversation history | Turn log | Last 10 turns, 200 chars each |
//! | Rolling summary | Summarizer | Last 8 turns, once ≥ 4 exist |
//! | Relevant previous context | Context buffer | Last 10 entries, 3 matches |
//! | RAG context | Exemplar index | Top-K documents |

pub mod cleaning;
pub mod conversation;
pub mod prompt;
pub mod relevance;
pub mod summarizer;

pub use cleaning::{ScanState, clean_activities, separate_response_and_activities};
pub use conversation::{render_history, truncate_chars};
pub use prompt::ResponsePromptInput;
pub use relevance::relevant;
pub use summarizer::ConversationSummarizer;
