use shared::{ConversationSummaryDto, MessageDto, StartThreadResponse};

use crate::domain::models::{ConversationSummary, Message, ThreadId};

pub struct ConversationMapper;

impl ConversationMapper {
    pub fn to_message_dto(message: Message) -> MessageDto {
        MessageDto {
            message: message.message,
            date: message.date,
            time: message.time,
            sender: message.sender,
        }
    }

    pub fn to_summary_dto(summary: ConversationSummary) -> ConversationSummaryDto {
        ConversationSummaryDto {
            index: summary.thread.0,
            message: summary.first.message,
            date: summary.first.date,
            time: summary.first.time,
            sender: summary.first.sender,
            count: summary.count,
        }
    }

    pub fn to_start_thread_response(thread: ThreadId) -> StartThreadResponse {
        StartThreadResponse {
            thread_id: thread.key(),
            index: thread.0,
        }
    }
}
