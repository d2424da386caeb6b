#[gpilot_derive::gpilot_slice]
pub struct Toggles {
    max_disabled: usize,
    label: String,
}

fn main() {
    let toggles = Toggles::new(TogglesInner { max_disabled: 3, label: "off".to_owned() });
    let shared = toggles.clone();
    assert_eq!(shared.max_disabled, 3);
    assert_eq!(shared.label, "off");
    assert!(format!("{toggles:?}").contains("TogglesInner"));
}
