pub type Endpoint = str;

pub const LOGIN: &Endpoint = "/pool/poolLogin/login";
pub const DISCONNECT: &Endpoint = "/pool/poolLogin/disconnect";
pub const EDIT_POOL_OWN: &Endpoint = "/pool/poolEdit/own";
pub const POOL_LIST_OWN: &Endpoint = "/pool/poolList/own";
pub const POOL_HISTORIC: &Endpoint = "/pool/poolHistoric";
pub const VALUES_HISTORY: &Endpoint = "/pool/ajaxHistoric/getJsonValues";
pub const GET_ALARMS: &Endpoint = "/pool/ajaxAlarms/get";
pub const GET_COMMANDS: &Endpoint = "/pool/ajaxCommands/get";
pub const SAVE_COMMANDS: &Endpoint = "/pool/ajaxCommands/save";
pub const GET_SETPOINTS: &Endpoint = "/pool/ajaxSetpoints/get";
pub const SAVE_SETPOINTS: &Endpoint = "/pool/ajaxSetpoints/save";
// pub const CURRENT_ORDERS: &Endpoint = "/pool/ajaxOmeoGetCurrentsOrder";
