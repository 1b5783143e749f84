//! CONCATENATE strategy
//!
//! Music plays alone before and after the narration:
//! `intro music ++ narration ++ outro music`.
//!
//! Only the outro may loop. An intro longer than the music is an
//! `InsufficientSource` error, never a silently shortened or looped intro.

use tracing::debug;

use super::request::CompositionRequest;
use crate::dsp::{extend_to_at_least, fade_in, fade_out, intro_window, outro_window_from_end};
use crate::engine::PcmBuffer;
use crate::error::{PodmixError, Result};

pub(crate) fn compose_concatenate(
    narration: &PcmBuffer,
    music: &PcmBuffer,
    request: &CompositionRequest,
) -> Result<PcmBuffer> {
    let music = music.apply_gain_db(request.music_gain_db);
    let music_ms = music.duration_ms();

    let intro_ms = request.intro_duration_ms;
    let intro = if intro_ms > 0 {
        if music_ms < intro_ms {
            return Err(PodmixError::InsufficientSource {
                required_ms: intro_ms,
                available_ms: music_ms,
                reason: "music is shorter than the intro and the intro never loops".to_string(),
            });
        }
        Some(fade_out(
            &intro_window(&music, intro_ms)?,
            request.intro_fade_ms,
        ))
    } else {
        None
    };

    let outro_ms = request.outro_duration_ms;
    let outro = if outro_ms > 0 {
        let source = if music_ms < outro_ms {
            // Short music: loop it and take the head, not the tail
            let extended = extend_to_at_least(&music, outro_ms)?;
            debug!(
                music_ms,
                outro_ms,
                extended_ms = extended.duration_ms(),
                "Looped music for outro"
            );
            intro_window(&extended, outro_ms)?
        } else {
            outro_window_from_end(&music, outro_ms)?
        };
        Some(fade_in(&source, request.outro_fade_ms))
    } else {
        None
    };
    drop(music);

    let mut result = match intro {
        Some(intro) => intro.concat(narration)?,
        None => narration.clone(),
    };
    if let Some(outro) = outro {
        result = result.concat(&outro)?;
    }

    Ok(result)
}
