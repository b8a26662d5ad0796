use esl_utils::ascii::eq_ignore_case;

/// The closed vocabulary of event kinds. The ordinal is load-bearing:
/// the wire `Event-Name` header text is derived from it via
/// [`EventId::as_str`], so new kinds may only ever be appended before
/// `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum EventId {
    Custom = 0,
    Clone = 1,
    ChannelCreate = 2,
    ChannelDestroy = 3,
    ChannelState = 4,
    ChannelCallstate = 5,
    ChannelAnswer = 6,
    ChannelHangup = 7,
    ChannelHangupComplete = 8,
    ChannelExecute = 9,
    ChannelExecuteComplete = 10,
    ChannelHold = 11,
    ChannelUnhold = 12,
    ChannelBridge = 13,
    ChannelUnbridge = 14,
    ChannelProgress = 15,
    ChannelProgressMedia = 16,
    ChannelOutgoing = 17,
    ChannelPark = 18,
    ChannelUnpark = 19,
    ChannelApplication = 20,
    ChannelOriginate = 21,
    ChannelUuid = 22,
    Api = 23,
    Log = 24,
    InboundChan = 25,
    OutboundChan = 26,
    Startup = 27,
    Shutdown = 28,
    Publish = 29,
    Unpublish = 30,
    Talk = 31,
    Notalk = 32,
    SessionCrash = 33,
    ModuleLoad = 34,
    ModuleUnload = 35,
    Dtmf = 36,
    Message = 37,
    PresenceIn = 38,
    NotifyIn = 39,
    PresenceOut = 40,
    PresenceProbe = 41,
    MessageWaiting = 42,
    MessageQuery = 43,
    Roster = 44,
    Codec = 45,
    BackgroundJob = 46,
    DetectedSpeech = 47,
    DetectedTone = 48,
    PrivateCommand = 49,
    Heartbeat = 50,
    Trap = 51,
    AddSchedule = 52,
    DelSchedule = 53,
    ExeSchedule = 54,
    ReSchedule = 55,
    Reloadxml = 56,
    Notify = 57,
    PhoneFeature = 58,
    PhoneFeatureSubscribe = 59,
    SendMessage = 60,
    RecvMessage = 61,
    RequestParams = 62,
    ChannelData = 63,
    General = 64,
    Command = 65,
    SessionHeartbeat = 66,
    ClientDisconnected = 67,
    ServerDisconnected = 68,
    SendInfo = 69,
    RecvInfo = 70,
    RecvRtcpMessage = 71,
    SendRtcpMessage = 72,
    CallSecure = 73,
    Nat = 74,
    RecordStart = 75,
    RecordStop = 76,
    PlaybackStart = 77,
    PlaybackStop = 78,
    CallUpdate = 79,
    Failure = 80,
    SocketData = 81,
    MediaBugStart = 82,
    MediaBugStop = 83,
    ConferenceDataQuery = 84,
    ConferenceData = 85,
    CallSetupReq = 86,
    CallSetupResult = 87,
    CallDetail = 88,
    DeviceState = 89,
    Text = 90,
    ShutdownRequested = 91,
    All = 92,
}

/// Keep in sync with the `EventId` discriminants above; never reorder,
/// only append before `All`.
const EVENT_NAMES: [&str; 93] = [
    "CUSTOM",
    "CLONE",
    "CHANNEL_CREATE",
    "CHANNEL_DESTROY",
    "CHANNEL_STATE",
    "CHANNEL_CALLSTATE",
    "CHANNEL_ANSWER",
    "CHANNEL_HANGUP",
    "CHANNEL_HANGUP_COMPLETE",
    "CHANNEL_EXECUTE",
    "CHANNEL_EXECUTE_COMPLETE",
    "CHANNEL_HOLD",
    "CHANNEL_UNHOLD",
    "CHANNEL_BRIDGE",
    "CHANNEL_UNBRIDGE",
    "CHANNEL_PROGRESS",
    "CHANNEL_PROGRESS_MEDIA",
    "CHANNEL_OUTGOING",
    "CHANNEL_PARK",
    "CHANNEL_UNPARK",
    "CHANNEL_APPLICATION",
    "CHANNEL_ORIGINATE",
    "CHANNEL_UUID",
    "API",
    "LOG",
    "INBOUND_CHAN",
    "OUTBOUND_CHAN",
    "STARTUP",
    "SHUTDOWN",
    "PUBLISH",
    "UNPUBLISH",
    "TALK",
    "NOTALK",
    "SESSION_CRASH",
    "MODULE_LOAD",
    "MODULE_UNLOAD",
    "DTMF",
    "MESSAGE",
    "PRESENCE_IN",
    "NOTIFY_IN",
    "PRESENCE_OUT",
    "PRESENCE_PROBE",
    "MESSAGE_WAITING",
    "MESSAGE_QUERY",
    "ROSTER",
    "CODEC",
    "BACKGROUND_JOB",
    "DETECTED_SPEECH",
    "DETECTED_TONE",
    "PRIVATE_COMMAND",
    "HEARTBEAT",
    "TRAP",
    "ADD_SCHEDULE",
    "DEL_SCHEDULE",
    "EXE_SCHEDULE",
    "RE_SCHEDULE",
    "RELOADXML",
    "NOTIFY",
    "PHONE_FEATURE",
    "PHONE_FEATURE_SUBSCRIBE",
    "SEND_MESSAGE",
    "RECV_MESSAGE",
    "REQUEST_PARAMS",
    "CHANNEL_DATA",
    "GENERAL",
    "COMMAND",
    "SESSION_HEARTBEAT",
    "CLIENT_DISCONNECTED",
    "SERVER_DISCONNECTED",
    "SEND_INFO",
    "RECV_INFO",
    "RECV_RTCP_MESSAGE",
    "SEND_RTCP_MESSAGE",
    "CALL_SECURE",
    "NAT",
    "RECORD_START",
    "RECORD_STOP",
    "PLAYBACK_START",
    "PLAYBACK_STOP",
    "CALL_UPDATE",
    "FAILURE",
    "SOCKET_DATA",
    "MEDIA_BUG_START",
    "MEDIA_BUG_STOP",
    "CONFERENCE_DATA_QUERY",
    "CONFERENCE_DATA",
    "CALL_SETUP_REQ",
    "CALL_SETUP_RESULT",
    "CALL_DETAIL",
    "DEVICE_STATE",
    "TEXT",
    "SHUTDOWN_REQUESTED",
    "ALL",
];

impl EventId {
    /// The stable wire name for this event kind.
    pub const fn as_str(self) -> &'static str {
        EVENT_NAMES[self as usize]
    }

    /// Every ordinal from `Custom` to `All` is in range by construction,
    /// so this never fails for a value produced by this enum; it exists
    /// to reconstruct an `EventId` from a decoded ordinal (e.g. from a
    /// wire index), falling back to `Clone` for anything out of range,
    /// matching the closed-vocabulary invariant.
    pub const fn from_ordinal(ordinal: u16) -> Self {
        // SAFETY-free: a match is simplest and keeps the discriminant
        // list as the only source of truth.
        match ordinal {
            0 => Self::Custom,
            1 => Self::Clone,
            2 => Self::ChannelCreate,
            3 => Self::ChannelDestroy,
            4 => Self::ChannelState,
            5 => Self::ChannelCallstate,
            6 => Self::ChannelAnswer,
            7 => Self::ChannelHangup,
            8 => Self::ChannelHangupComplete,
            9 => Self::ChannelExecute,
            10 => Self::ChannelExecuteComplete,
            11 => Self::ChannelHold,
            12 => Self::ChannelUnhold,
            13 => Self::ChannelBridge,
            14 => Self::ChannelUnbridge,
            15 => Self::ChannelProgress,
            16 => Self::ChannelProgressMedia,
            17 => Self::ChannelOutgoing,
            18 => Self::ChannelPark,
            19 => Self::ChannelUnpark,
            20 => Self::ChannelApplication,
            21 => Self::ChannelOriginate,
            22 => Self::ChannelUuid,
            23 => Self::Api,
            24 => Self::Log,
            25 => Self::InboundChan,
            26 => Self::OutboundChan,
            27 => Self::Startup,
            28 => Self::Shutdown,
            29 => Self::Publish,
            30 => Self::Unpublish,
            31 => Self::Talk,
            32 => Self::Notalk,
            33 => Self::SessionCrash,
            34 => Self::ModuleLoad,
            35 => Self::ModuleUnload,
            36 => Self::Dtmf,
            37 => Self::Message,
            38 => Self::PresenceIn,
            39 => Self::NotifyIn,
            40 => Self::PresenceOut,
            41 => Self::PresenceProbe,
            42 => Self::MessageWaiting,
            43 => Self::MessageQuery,
            44 => Self::Roster,
            45 => Self::Codec,
            46 => Self::BackgroundJob,
            47 => Self::DetectedSpeech,
            48 => Self::DetectedTone,
            49 => Self::PrivateCommand,
            50 => Self::Heartbeat,
            51 => Self::Trap,
            52 => Self::AddSchedule,
            53 => Self::DelSchedule,
            54 => Self::ExeSchedule,
            55 => Self::ReSchedule,
            56 => Self::Reloadxml,
            57 => Self::Notify,
            58 => Self::PhoneFeature,
            59 => Self::PhoneFeatureSubscribe,
            60 => Self::SendMessage,
            61 => Self::RecvMessage,
            62 => Self::RequestParams,
            63 => Self::ChannelData,
            64 => Self::General,
            65 => Self::Command,
            66 => Self::SessionHeartbeat,
            67 => Self::ClientDisconnected,
            68 => Self::ServerDisconnected,
            69 => Self::SendInfo,
            70 => Self::RecvInfo,
            71 => Self::RecvRtcpMessage,
            72 => Self::SendRtcpMessage,
            73 => Self::CallSecure,
            74 => Self::Nat,
            75 => Self::RecordStart,
            76 => Self::RecordStop,
            77 => Self::PlaybackStart,
            78 => Self::PlaybackStop,
            79 => Self::CallUpdate,
            80 => Self::Failure,
            81 => Self::SocketData,
            82 => Self::MediaBugStart,
            83 => Self::MediaBugStop,
            84 => Self::ConferenceDataQuery,
            85 => Self::ConferenceData,
            86 => Self::CallSetupReq,
            87 => Self::CallSetupResult,
            88 => Self::CallDetail,
            89 => Self::DeviceState,
            90 => Self::Text,
            91 => Self::ShutdownRequested,
            92 => Self::All,
            _ => Self::Clone,
        }
    }

    /// Case-insensitive reverse lookup. Also accepts a name prefixed
    /// with up to 13 extra characters (to tolerate `SWITCH_EVENT_`
    /// style prefixes seen on the wire).
    pub fn name_event(text: &str) -> Option<Self> {
        for ordinal in 0..=EventId::All as u16 {
            let candidate = Self::from_ordinal(ordinal);
            let name = candidate.as_str();
            if eq_ignore_case(text, name) {
                return Some(candidate);
            }
            if text.len() > 13 && eq_ignore_case(&text[13..], name) {
                return Some(candidate);
            }
        }
        None
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::Custom
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_round_trips_through_name() {
        for ordinal in 0..=EventId::All as u16 {
            let id = EventId::from_ordinal(ordinal);
            assert_eq!(EventId::name_event(id.as_str()), Some(id));
        }
    }

    #[test]
    fn name_event_tolerates_prefix() {
        assert_eq!(EventId::name_event("SWITCH_EVENT_API"), Some(EventId::Api));
        assert_eq!(EventId::name_event("api"), Some(EventId::Api));
    }

    #[test]
    fn out_of_range_ordinal_falls_back_to_clone() {
        assert_eq!(EventId::from_ordinal(9999), EventId::Clone);
    }
}
