pub mod host_information;
