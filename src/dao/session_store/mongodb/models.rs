use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{
    GameConfigEntity, GamePhaseEntity, GameStatsEntity, QuestionRecordEntity, SessionEntity,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSessionDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    player_id: String,
    created_at: DateTime,
    updated_at: DateTime,
    phase: GamePhaseEntity,
    config: GameConfigEntity,
    stats: MongoStatsDocument,
    question_history: Vec<QuestionRecordEntity>,
}

/// Statistics sub-document; `started_at` is stored as a BSON datetime rather
/// than the serde default for `SystemTime`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MongoStatsDocument {
    questions_answered: u32,
    correct_answers: u32,
    current_streak: u32,
    max_streak: u32,
    total_score: u32,
    points_this_session: u32,
    total_time_played_secs: u64,
    average_time_per_question_secs: f64,
    accuracy: f64,
    started_at: DateTime,
}

impl From<GameStatsEntity> for MongoStatsDocument {
    fn from(value: GameStatsEntity) -> Self {
        Self {
            questions_answered: value.questions_answered,
            correct_answers: value.correct_answers,
            current_streak: value.current_streak,
            max_streak: value.max_streak,
            total_score: value.total_score,
            points_this_session: value.points_this_session,
            total_time_played_secs: value.total_time_played_secs,
            average_time_per_question_secs: value.average_time_per_question_secs,
            accuracy: value.accuracy,
            started_at: DateTime::from_system_time(value.started_at),
        }
    }
}

impl From<MongoStatsDocument> for GameStatsEntity {
    fn from(value: MongoStatsDocument) -> Self {
        Self {
            questions_answered: value.questions_answered,
            correct_answers: value.correct_answers,
            current_streak: value.current_streak,
            max_streak: value.max_streak,
            total_score: value.total_score,
            points_this_session: value.points_this_session,
            total_time_played_secs: value.total_time_played_secs,
            average_time_per_question_secs: value.average_time_per_question_secs,
            accuracy: value.accuracy,
            started_at: value.started_at.to_system_time(),
        }
    }
}

impl From<SessionEntity> for MongoSessionDocument {
    fn from(value: SessionEntity) -> Self {
        Self {
            id: value.id,
            player_id: value.player_id,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
            phase: value.phase,
            config: value.config,
            stats: value.stats.into(),
            question_history: value.question_history,
        }
    }
}

impl From<MongoSessionDocument> for SessionEntity {
    fn from(value: MongoSessionDocument) -> Self {
        Self {
            id: value.id,
            player_id: value.player_id,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
            phase: value.phase,
            config: value.config,
            stats: value.stats.into(),
            question_history: value.question_history,
        }
    }
}

fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}
