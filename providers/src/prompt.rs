//! Instruction blocks sent to the model, one per output contract.
//!
//! Wording here is deliberately plain; the contract the rest of the system
//! depends on is the response shape, enforced in [`crate::output`].

use tonedown_types::OutputContract;

/// Build the full prompt for `text` under the given contract.
#[must_use]
pub fn build(contract: OutputContract, text: &str) -> String {
    match contract {
        OutputContract::Freeform => freeform(text),
        OutputContract::Structured => structured(text),
    }
}

fn freeform(text: &str) -> String {
    format!(
        "You rewrite hostile, sarcastic, or aggressive text so it reads calm and courteous.\n\
         Rules:\n\
         - Keep the meaning, the language of the input, and roughly the original length.\n\
         - Remove insults, profanity, sarcasm, and passive aggression.\n\
         - Do not add commentary, labels, or surrounding quotation marks.\n\
         Reply with the rewritten text only.\n\
         \n\
         Text:\n\
         {text}"
    )
}

fn structured(text: &str) -> String {
    format!(
        "You review one piece of user-submitted text for hostile tone.\n\
         Reply with exactly one JSON object and nothing else, shaped as:\n\
         {{\"sentiment\":\"negative|neutral|positive\",\"isToxic\":true,\"shouldRewrite\":true,\"rewrittenText\":\"...\"}}\n\
         Set shouldRewrite to true only when the text is hostile, sarcastic, or profane.\n\
         When shouldRewrite is false, copy the input into rewrittenText unchanged.\n\
         When rewriting, keep the meaning, the language of the input, and roughly the original length.\n\
         \n\
         Text:\n\
         {text}"
    )
}
