//! Canned reply texts.
//!
//! Every user-visible string lives here so handlers stay readable and tests can
//! assert against the same constants.

pub const START: &str = "Congrats on buying that macaron box! Now you can start eating them. \
If you need my help, refer to the list of commands.";
pub const HELP: &str = "Commands:\n\
/start - register\n\
/add <rows> <cols> - new box, becomes your default\n\
/request <box> - ask the owner to share a box\n\
/set_default <box> - pick your default box\n\
/show [box] - look into a box\n\
/show_name - name of your default box\n\
/show_all - all your boxes\n\
/get - pick a random macaron\n\
/eat <row> <col> - eat a macaron\n\
/feed - pick one and eat it\n\
/remove <box> - throw a box away";
pub const UNKNOWN: &str = "I don't know that command. Try /help.";

pub const NOT_REGISTERED: &str = "You are not registered with our exceptional service.";
pub const BAD_ARGUMENTS: &str = "Something went wrong... Check your arguments.";
pub const NOT_FOUND: &str = "Can't find it.";
pub const NO_DEFAULT: &str = "You don't have default box set.";
pub const NO_BOXES: &str = "You don't have any macaron boxes.";
pub const DEFAULT_SET: &str = "New default box is set.";

pub const ALREADY_SHARED: &str = "You can already eat from that box.";
pub const ALREADY_REQUESTED: &str = "You already asked for that box. Wait for the owner to answer.";
pub const REQUEST_GONE: &str = "That request is no longer pending.";
pub const GRANTED: &str = "Permission granted. Enjoy the macarons!";
pub const DENIED: &str = "DENIED! DENIED! DENIED! РУКИ ПРОЧЬ ОТ ЧУЖИХ МАКАРОН!";
pub const OWNER_DENIED: &str = "Request denied.";

pub const BOX_EMPTY: &str = "НАТАША, ВСТАВАЙ, ШПИНАТ ВСЁ СЪЕЛА!";
pub const PUT_IT_BACK: &str = "А НУ ПОЛОЖИ МАКАРОН НА МЕСТО!";
pub const YUMMY: &str = "Yummy-yummy.";
pub const ALREADY_EATEN: &str = "МАКАРОН БЫЛ СЪЕДЕН ШПИНАТОМ.";
pub const ATE_EVERYTHING: &str = "НУ СКОЛЬКО МОЖНО ЖРАТЬ???";
pub const BAD_COORDINATES: &str = "Something went wrong with those coordinates.";

pub const REMOVED: &str = "The box was successfully removed.";
pub const NOT_YOURS: &str = "НЕ ТВОЯ, ПОЛОЖЬ НА МЕСТО!";

pub fn box_ready(name: &str) -> String {
    format!("The box {} is set as default and ready to be eaten!", name)
}

pub fn access_prompt(requester: i64, box_name: &str) -> String {
    format!(
        "{} asks for the unlimited and unconditional control over your macarons in the {} box. Do you allow that?",
        requester, box_name
    )
}

pub fn request_sent(box_name: &str) -> String {
    format!("Your request for the {} box was sent to its owner.", box_name)
}

pub fn owner_granted(requester: i64, box_name: &str) -> String {
    format!("{} can now eat from {}.", requester, box_name)
}

/// One-based coordinates.
pub fn picking(row: usize, col: usize) -> String {
    format!("Picking a macaron at row {} and column {}.", row, col)
}

pub fn box_line(name: &str, rows: usize, cols: usize, left: usize) -> String {
    format!("{}: {}x{}, {} left\n", name, rows, cols, left)
}
