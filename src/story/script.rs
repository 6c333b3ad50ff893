// Dialogue scripts.

/// One line in a dialogue box, attributed to a speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub speaker: &'static str,
    pub text: &'static str,
}

const fn line(speaker: &'static str, text: &'static str) -> Line {
    Line { speaker, text }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogueId {
    Intro,
    SchoolHint,
    SupplyRoom,
    ShroomScout,
    GoombaSentinel,
    TraceJoins,
    RoyalKoopas,
    ShadowLuigi,
    FinalBoss,
    Ending,
}

impl DialogueId {
    pub fn lines(self) -> &'static [Line] {
        match self {
            DialogueId::Intro => const { &[
                line("", "Threshold Academy. Monday morning."),
                line("Joseph", "Another ordinary day..."),
                line("Joseph", "Or so I thought."),
            ] },
            DialogueId::SchoolHint => const { &[
                line("Becca", "Joseph! Over here!"),
                line("Becca", "The supply room looks suspicious..."),
            ] },
            DialogueId::SupplyRoom => const { &[
                line("Joseph", "Huh? The supply room door is open..."),
                line("Becca", "Everyone, stay close. We're going in."),
            ] },
            DialogueId::ShroomScout => const { &[
                line("Shroom Scout", "Halt! You trespass in the Dark World!"),
                line("Joseph", "We don't mean any harm!"),
                line("Becca", "Get ready for battle!"),
            ] },
            DialogueId::GoombaSentinel => const { &[
                line("Goomba Sentinel", "I am the guardian of the First Gate!"),
                line("Goomba Sentinel", "Prove your worth, Lightners!"),
            ] },
            DialogueId::TraceJoins => const { &[
                line("Trace", "That was amazing! Can I join you?"),
                line("Becca", "...Alright. But stay close."),
                line("Trace", "YES! Adventure time!"),
            ] },
            DialogueId::RoyalKoopas => const { &[
                line("Royal Koopa Alpha", "Halt! Who approaches the Second Gate?"),
                line("Royal Koopa Beta", "Lightners! In our domain!"),
                line("Joseph", "We just want to pass through!"),
            ] },
            DialogueId::ShadowLuigi => const { &[
                line("Shadow Luigi", "Yahoo! Finally, some fun visitors!"),
                line("Shadow Luigi", "Let's play a game! Catch me if you can!"),
            ] },
            DialogueId::FinalBoss => const { &[
                line("Bowser Lord of Embers", "So. The Lightners have come at last."),
                line("Bowser Lord of Embers", "I am the seal. The guardian."),
                line("Bowser Lord of Embers", "If I fall... everything ends."),
            ] },
            DialogueId::Ending => const { &[
                line("Bowser Lord of Embers", "...You showed me mercy. Why?"),
                line("Joseph", "Because everyone deserves a second chance."),
                line("Becca", "The Dark World is safe now. And so are we."),
                line("Trace", "That was the BEST adventure ever!"),
                line("", "THE END. Thanks for playing!"),
            ] },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_script_has_text() {
        for id in [
            DialogueId::Intro,
            DialogueId::SchoolHint,
            DialogueId::SupplyRoom,
            DialogueId::ShroomScout,
            DialogueId::GoombaSentinel,
            DialogueId::TraceJoins,
            DialogueId::RoyalKoopas,
            DialogueId::ShadowLuigi,
            DialogueId::FinalBoss,
            DialogueId::Ending,
        ] {
            let lines = id.lines();
            assert!(!lines.is_empty(), "{id:?}");
            assert!(lines.iter().all(|l| !l.text.is_empty()), "{id:?}");
        }
    }
}
