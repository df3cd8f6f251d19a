use dispatch_bus::{Action, ChannelName};

#[derive(Action, Clone, Debug, PartialEq)]
enum PlainAction {
    Refresh,
    Select(usize),
    Rename { from: String, to: String },
}

#[derive(Action, Clone, Debug, PartialEq)]
enum DataAction {
    #[action(name = "[Data] Load data")]
    DataLoad,
    #[action(name = "[Data] Data loaded", channel = "[Data] Load data")]
    DataDidLoad(Vec<u32>),
    Quit,
}

#[test]
fn test_name_defaults_to_variant() {
    assert_eq!(PlainAction::Refresh.name(), "Refresh");
    assert_eq!(PlainAction::Select(3).name(), "Select");
    let rename = PlainAction::Rename {
        from: "a".into(),
        to: "b".into(),
    };
    assert_eq!(rename.name(), "Rename");
}

#[test]
fn test_channel_defaults_to_name() {
    assert_eq!(PlainAction::Refresh.channel(), ChannelName::from("Refresh"));
    assert_eq!(PlainAction::Select(0).channel(), "Select");
}

#[test]
fn test_name_override() {
    assert_eq!(DataAction::DataLoad.name(), "[Data] Load data");
    assert_eq!(DataAction::DataDidLoad(vec![]).name(), "[Data] Data loaded");
    assert_eq!(DataAction::Quit.name(), "Quit");
}

#[test]
fn test_channel_override() {
    assert_eq!(DataAction::DataLoad.channel(), "[Data] Load data");
    assert_eq!(DataAction::DataDidLoad(vec![1]).channel(), "[Data] Load data");
    assert_eq!(DataAction::Quit.channel(), "Quit");
}
