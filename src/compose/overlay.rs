//! OVERLAY strategy
//!
//! Music is mixed under the first and last portion of the narration. The
//! output is exactly as long as the narration.

use tracing::debug;

use super::request::{CompositionRequest, OutroPlacement};
use crate::dsp::{
    extend_to_at_least, fade_in, fade_out, intro_window, outro_window_from_end, window_at,
};
use crate::engine::PcmBuffer;
use crate::error::Result;

pub(crate) fn compose_overlay(
    narration: &PcmBuffer,
    music: &PcmBuffer,
    request: &CompositionRequest,
) -> Result<PcmBuffer> {
    // Windows never reach past the narration, otherwise the mix would
    // lengthen the output.
    let narration_ms = narration.duration_ms();
    let intro_ms = request.intro_duration_ms.min(narration_ms);
    let outro_ms = request.outro_duration_ms.min(narration_ms);
    if intro_ms != request.intro_duration_ms || outro_ms != request.outro_duration_ms {
        debug!(
            narration_ms,
            intro_ms, outro_ms, "Clamped overlay windows to narration length"
        );
    }

    let required_ms = match request.outro_placement {
        OutroPlacement::FollowingIntro => intro_ms + outro_ms,
        OutroPlacement::TailOfMusic => intro_ms.max(outro_ms),
    };
    if required_ms == 0 {
        return Ok(narration.clone());
    }

    let (intro, outro) = {
        let music = music.apply_gain_db(request.music_gain_db);
        let music = extend_to_at_least(&music, required_ms)?;

        let intro = if intro_ms > 0 {
            Some(fade_out(
                &intro_window(&music, intro_ms)?,
                request.intro_fade_ms,
            ))
        } else {
            None
        };

        let outro = if outro_ms > 0 {
            let source = match request.outro_placement {
                OutroPlacement::FollowingIntro => window_at(&music, intro_ms, outro_ms)?,
                OutroPlacement::TailOfMusic => outro_window_from_end(&music, outro_ms)?,
            };
            Some(fade_in(&source, request.outro_fade_ms))
        } else {
            None
        };

        (intro, outro)
    };

    let mut result = narration.clone();
    if let Some(intro) = intro {
        result = result.mix_at(&intro, 0)?;
    }
    if let Some(outro) = outro {
        // Outro ends on the narration's last frame
        let offset = narration.frame_count() - outro.frame_count();
        debug!(offset_frames = offset, placement = ?request.outro_placement, "Placing outro");
        result = result.mix_at(&outro, offset)?;
    }

    Ok(result)
}
