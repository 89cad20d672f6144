//! Contract bindings.
//!
//! Only the functions the tooling calls are declared. The contracts expose
//! much more; widen these ABIs when a flow needs it, not before.

use ethers::contract::abigen;

abigen!(
    Erc20Token,
    r#"[
        function name() external view returns (string)
        function symbol() external view returns (string)
        function decimals() external view returns (uint8)
        function totalSupply() external view returns (uint256)
        function balanceOf(address owner) external view returns (uint256)
        function approve(address spender, uint256 amount) external returns (bool)
        function mint(address to, uint256 amount) external
    ]"#
);

abigen!(
    CredbullVault,
    r#"[
        function asset() external view returns (address)
        function totalAssets() external view returns (uint256)
        function paused() external view returns (bool)
        function checkMaturity() external view returns (bool)
        function CUSTODIAN() external view returns (address)
        function previewRedeem(uint256 shares) external view returns (uint256)
        function deposit(uint256 assets, address receiver) external returns (uint256)
        function redeem(uint256 shares, address receiver, address owner) external returns (uint256)
        function toggleWindowCheck(bool status) external
        function toggleMaturityCheck(bool status) external
    ]"#
);

abigen!(
    UpsideVault,
    r#"[
        function token() external view returns (address)
    ]"#
);

abigen!(
    VaultFactory,
    r#"[
        function allowCustodian(address custodian) external returns (address)
    ]"#
);
